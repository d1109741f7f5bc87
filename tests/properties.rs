//! Property-based tests for parsing and rendering
//!
//! Every input converts without panicking, text that carries no markup
//! comes back out unchanged, and spans never contain block structure.

use std::time::{Duration, Instant};

use dismark::{Node, Options, Profile, parse_only, to_html};
use proptest::prelude::*;

/// Inputs dense in markup characters.
fn markup_strategy() -> impl Strategy<Value = String> {
    "[-*_~`|>#<@&!:./\\\\()\\[\\]a-z0-9 \n]{0,120}"
}

/// Lines built from list bullets, quote markers and span delimiters.
fn nested_markup_strategy() -> impl Strategy<Value = String> {
    "(- |  - |1\\. |> |>>> |# |\\*|\\*\\*|__|_|~~|\\|\\||```|[a-z ]|\n){0,60}"
}

fn options_for(profile: Profile, escape_html: bool) -> Options {
    Options {
        embed: profile == Profile::Embed,
        discord_only: profile == Profile::MentionOnly,
        escape_html,
        ..Options::default()
    }
}

fn text_of(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text { content } => content.as_str(),
            _ => "",
        })
        .collect()
}

/// True when a list, quote, heading or code block sits inside a span.
fn block_under_inline(nodes: &[Node], inline: bool) -> bool {
    nodes.iter().any(|node| match node {
        Node::List { items, .. } => {
            inline || items.iter().any(|item| block_under_inline(item, inline))
        }
        Node::BlockQuote { children } => inline || block_under_inline(children, inline),
        Node::Heading { children, .. } => inline || block_under_inline(children, true),
        Node::CodeBlock { .. } => inline,
        other => block_under_inline(other.children(), true),
    })
}

fn assert_converts_quickly(source: &str) {
    let started = Instant::now();
    let _ = to_html(source, &Options::default());
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_secs(10),
        "{} bytes took {elapsed:?}",
        source.len()
    );
}

#[test]
fn test_underscore_runs_convert_quickly() {
    assert_converts_quickly(&"_a".repeat(40_000));
    assert_converts_quickly(&"a_".repeat(40_000));
}

#[test]
fn test_long_word_before_colon_converts_quickly() {
    assert_converts_quickly(&format!("{}:x", "a".repeat(80_000)));
    assert_converts_quickly(&"ahttp:x ".repeat(10_000));
}

proptest! {
    #[test]
    fn test_any_input_converts(source in "\\PC{0,200}") {
        for profile in [Profile::Default, Profile::Embed, Profile::MentionOnly] {
            let _ = to_html(&source, &options_for(profile, true));
        }
    }

    #[test]
    fn test_markup_heavy_input_converts(source in markup_strategy()) {
        for profile in [Profile::Default, Profile::Embed, Profile::MentionOnly] {
            let _ = to_html(&source, &options_for(profile, false));
        }
    }

    #[test]
    fn test_mention_only_reproduces_entity_free_input(source in "[^<@]{0,200}") {
        let html = to_html(&source, &options_for(Profile::MentionOnly, false));
        prop_assert_eq!(html, source);
    }

    #[test]
    fn test_plain_words_pass_through(source in "[a-zA-Z0-9 ]{0,100}") {
        let html = to_html(&source, &Options::default());
        prop_assert_eq!(html, source);
    }

    #[test]
    fn test_punctuated_prose_keeps_every_character(source in "[a-zA-Z ,.!?']{0,100}") {
        let nodes = parse_only(&source);
        let all_text = nodes.iter().all(|node| matches!(node, Node::Text { .. }));
        prop_assert!(all_text);
        prop_assert_eq!(text_of(&nodes), source);
    }

    #[test]
    fn test_spans_never_hold_blocks(source in nested_markup_strategy()) {
        for profile in [Profile::Default, Profile::Embed] {
            let rules = profile.rules();
            let options = options_for(profile, true);
            let nodes = dismark::Parser::new(rules).parse(&source, &options.context());
            prop_assert!(!block_under_inline(&nodes, false), "{:?}", nodes);
        }
    }
}
