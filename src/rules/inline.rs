//! Inline constructs: text, emphasis family, code spans, links, spoilers.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Capture, Rule, order};
use crate::ast::{Node, NodeKind};
use crate::context::Context;
use crate::html::{html_tag, sanitize_text, sanitize_url};
use crate::parser::Parser;
use crate::renderer::HtmlRenderer;

// Patterns shaped `^(body)(guard)` stand in for a trailing negative
// look-ahead: the guard must match but is not consumed.
static ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\\([^0-9A-Za-z\s])").unwrap());
static AUTOLINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^: >]+:/[^ >]+)>").unwrap());
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(https?://[^\s<]+[^<.,:;"')\]\s])"#).unwrap());
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\[((?:\[[^\]]*\]|[^\[\]])*)\]\(\s*<?((?:\([^)]*\)|[^\s\\]|\\.)*?)>?(?:\s+['"]([\s\S]*?)['"])?\s*\)"#,
    )
    .unwrap()
});
static URL_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([^0-9A-Za-z\s])").unwrap());
static EM_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(_((?:__|\\[\s\S]|[^\\_])+?)_)(?:[^A-Za-z0-9_]|$)").unwrap()
});
static EM_STAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*((?:\*\*|\\[\s\S]|\s+(?:\\[\s\S]|[^\s*\\]|\*\*)|[^\s*\\])+?)\*)(?:[^*]|$)")
        .unwrap()
});
static STRONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*\*((?:\\[\s\S]|[^\\])+?)\*\*)(?:[^*]|$)").unwrap());
static UNDERLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(__((?:\\[\s\S]|[^\\])+?)__)(?:[^_]|$)").unwrap());
static STRIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(~~([\s\S]+?)~~)(?:[^_]|$)").unwrap());
static SPOILER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|\|([\s\S]+?)\|\|").unwrap());

const SHRUG: &str = "¯\\_(ツ)_/¯";

fn regex_capture<'s>(re: &Regex, source: &'s str) -> Option<Capture<'s>> {
    re.captures(source).map(|caps| Capture::from_regex(&caps))
}

fn guarded_capture<'s>(re: &Regex, source: &'s str) -> Option<Capture<'s>> {
    re.captures(source).map(|caps| Capture::guarded(&caps))
}

fn render_text(content: &str, ctx: &Context<'_>) -> String {
    if ctx.escape_html {
        sanitize_text(content)
    } else {
        content.to_owned()
    }
}

fn wrap(tag: &str, children: &[Node], renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
    html_tag(tag, &renderer.render(children, ctx), &[], true, ctx)
}

/// Characters that end a text run: not ASCII alphanumeric, not whitespace,
/// not `-`, and below U+00C0.
fn is_special(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c >= '\u{c0}')
}

/// Offset inside the word at the head of `s` where a text run has to stop
/// so the bare URL rule can be tried there.
///
/// Only a word running into `:` and a non-space can be a scheme, and the
/// only schemes picked up mid-word are `http` and `https`. The word is
/// scanned once and never past its end, so `_` or any other special
/// character bounds the work.
fn scheme_stop(s: &str) -> Option<usize> {
    let run = s.bytes().take_while(u8::is_ascii_alphanumeric).count();
    let after = s[run..].strip_prefix(':')?;
    if after.chars().next().is_none_or(char::is_whitespace) {
        return None;
    }
    let word = &s[..run];
    word.strip_suffix("https")
        .or_else(|| word.strip_suffix("http"))
        .map(str::len)
}

/// Length of the text run at the head of `source`.
///
/// The first character is always taken. After it the run stops before a
/// special character, a newline, or an `http:`/`https:` scheme, so the
/// rules for those get a chance. Each word is checked once.
fn text_len(source: &str) -> usize {
    let mut chars = source.char_indices();
    if chars.next().is_none() {
        return 0;
    }
    let mut in_checked_word = false;
    for (i, c) in chars {
        if c == '\n' || is_special(c) {
            return i;
        }
        if c.is_ascii_alphanumeric() {
            if !in_checked_word {
                in_checked_word = true;
                if let Some(stop) = scheme_stop(&source[i..]) {
                    return i + stop;
                }
            }
        } else {
            in_checked_word = false;
        }
    }
    source.len()
}

/// Literal-text fallback. Matches any non-empty input.
#[derive(Debug, Clone, Copy)]
pub struct Text;

impl Rule for Text {
    fn name(&self) -> &'static str {
        "text"
    }

    fn order(&self) -> u32 {
        order::TEXT
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Text, NodeKind::Emoticon]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        let len = text_len(source);
        (len > 0).then(|| Capture::new(&source[..len]))
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::text(capture.matched())]
    }

    fn render(&self, node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        match node {
            Node::Text { content } | Node::Emoticon { content } => render_text(content, ctx),
            _ => String::new(),
        }
    }
}

/// `¯\_(ツ)_/¯`, kept whole so its arms are not read as markup.
#[derive(Debug, Clone, Copy)]
pub struct Emoticon;

impl Rule for Emoticon {
    fn name(&self) -> &'static str {
        "emoticon"
    }

    fn order(&self) -> u32 {
        order::EMOTICON
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        source
            .starts_with(SHRUG)
            .then(|| Capture::new(&source[..SHRUG.len()]))
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::Emoticon {
            content: capture.matched().to_owned(),
        }]
    }
}

/// Backslash before punctuation yields the punctuation as text.
#[derive(Debug, Clone, Copy)]
pub struct Escape;

impl Rule for Escape {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn order(&self) -> u32 {
        order::ESCAPE
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        regex_capture(&ESCAPE_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::text(capture.group(1).unwrap_or_default())]
    }
}

fn url_node(url: &str) -> Node {
    Node::Link {
        children: vec![Node::text(url)],
        target: url.to_owned(),
        title: None,
    }
}

fn render_link(node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
    let Node::Link {
        children,
        target,
        title,
    } = node
    else {
        return String::new();
    };
    html_tag(
        "a",
        &renderer.render(children, ctx),
        &[("href", sanitize_url(target)), ("title", title.clone())],
        true,
        ctx,
    )
}

/// `<scheme:/...>`
#[derive(Debug, Clone, Copy)]
pub struct Autolink;

impl Rule for Autolink {
    fn name(&self) -> &'static str {
        "autolink"
    }

    fn order(&self) -> u32 {
        order::AUTOLINK
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Link]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        regex_capture(&AUTOLINK_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![url_node(capture.group(1).unwrap_or_default())]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        render_link(node, renderer, ctx)
    }
}

/// Bare `http(s)://` URL, trailing punctuation excluded.
#[derive(Debug, Clone, Copy)]
pub struct Url;

impl Rule for Url {
    fn name(&self) -> &'static str {
        "url"
    }

    fn order(&self) -> u32 {
        order::URL
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Link]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        regex_capture(&URL_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![url_node(capture.group(1).unwrap_or_default())]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        render_link(node, renderer, ctx)
    }
}

/// Labelled `[text](target "title")` link. Embed profile only.
///
/// A label may hold balanced `[...]` groups but not a stray `]`.
#[derive(Debug, Clone, Copy)]
pub struct Link;

impl Rule for Link {
    fn name(&self) -> &'static str {
        "link"
    }

    fn order(&self) -> u32 {
        order::LINK
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Link]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        regex_capture(&LINK_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let label = capture.group(1).unwrap_or_default();
        let target = URL_ESCAPE_RE.replace_all(capture.group(2).unwrap_or_default(), "$1");
        vec![Node::Link {
            children: parser.parse(label, &ctx.with_inline(true)),
            target: target.into_owned(),
            title: capture.group(3).map(str::to_owned),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        render_link(node, renderer, ctx)
    }
}

/// `*text*` or `_text_`.
///
/// Inside another emphasis the span is dropped and only its children are
/// kept.
#[derive(Debug, Clone, Copy)]
pub struct Emphasis;

impl Rule for Emphasis {
    fn name(&self) -> &'static str {
        "em"
    }

    fn order(&self) -> u32 {
        order::EMPHASIS
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Emphasis]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        if source.starts_with('_') {
            return guarded_capture(&EM_UNDERSCORE_RE, source);
        }
        // the first character after `*` must not be whitespace
        let opens = source
            .strip_prefix('*')
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| !c.is_whitespace());
        if opens {
            guarded_capture(&EM_STAR_RE, source)
        } else {
            None
        }
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let inner = ctx.with_inline(true).with_emphasis(true);
        let children = parser.parse(capture.group(1).unwrap_or_default(), &inner);
        if ctx.in_emphasis {
            children
        } else {
            vec![Node::Emphasis { children }]
        }
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        wrap("em", node.children(), renderer, ctx)
    }
}

/// `**text**`
#[derive(Debug, Clone, Copy)]
pub struct Strong;

impl Rule for Strong {
    fn name(&self) -> &'static str {
        "strong"
    }

    fn order(&self) -> u32 {
        order::STRONG
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Strong]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        guarded_capture(&STRONG_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let content = capture.group(1).unwrap_or_default();
        vec![Node::Strong {
            children: parser.parse(content, &ctx.with_inline(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        wrap("strong", node.children(), renderer, ctx)
    }
}

/// `__text__`, underline rather than strong in this dialect.
#[derive(Debug, Clone, Copy)]
pub struct Underline;

impl Rule for Underline {
    fn name(&self) -> &'static str {
        "u"
    }

    fn order(&self) -> u32 {
        order::UNDERLINE
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Underline]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        guarded_capture(&UNDERLINE_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let content = capture.group(1).unwrap_or_default();
        vec![Node::Underline {
            children: parser.parse(content, &ctx.with_inline(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        wrap("u", node.children(), renderer, ctx)
    }
}

/// `~~text~~`, refused when the closing tildes touch an underscore.
#[derive(Debug, Clone, Copy)]
pub struct Strike;

impl Rule for Strike {
    fn name(&self) -> &'static str {
        "strike"
    }

    fn order(&self) -> u32 {
        order::STRIKE
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Strike]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        guarded_capture(&STRIKE_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let content = capture.group(1).unwrap_or_default();
        vec![Node::Strike {
            children: parser.parse(content, &ctx.with_inline(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        wrap("del", node.children(), renderer, ctx)
    }
}

/// Returns `(fence, content_end)` for a code span at the head of `source`.
///
/// The span opens with `fence` backticks, its content ends in a
/// non-backtick, and it closes with a run of exactly `fence` backticks.
/// When the full opening run finds no partner, shorter openings are tried.
fn code_span(source: &str) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();
    let opening = bytes.iter().take_while(|&&b| b == b'`').count();
    if opening == 0 {
        return None;
    }

    // first closing candidate for every run length after the opening run
    let mut first_run: HashMap<usize, usize> = HashMap::new();
    let mut i = opening;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let start = i;
            while i < bytes.len() && bytes[i] == b'`' {
                i += 1;
            }
            first_run.entry(i - start).or_insert(start);
        } else {
            i += 1;
        }
    }

    (1..=opening)
        .rev()
        .find_map(|fence| first_run.get(&fence).map(|&start| (fence, start)))
}

/// `` `code` `` spans, any fence length.
#[derive(Debug, Clone, Copy)]
pub struct InlineCode;

impl Rule for InlineCode {
    fn name(&self) -> &'static str {
        "inlineCode"
    }

    fn order(&self) -> u32 {
        order::INLINE_CODE
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::InlineCode]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        let (fence, end) = code_span(source)?;
        let content = &source[fence..end];
        Some(Capture::with_groups(
            &source[..end + fence],
            vec![Some(content.into())],
        ))
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::InlineCode {
            content: capture.group(1).unwrap_or_default().to_owned(),
        }]
    }

    fn render(&self, node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        let Node::InlineCode { content } = node else {
            return String::new();
        };
        html_tag("code", &sanitize_text(content.trim()), &[], true, ctx)
    }
}

/// `||hidden||`
#[derive(Debug, Clone, Copy)]
pub struct Spoiler;

impl Rule for Spoiler {
    fn name(&self) -> &'static str {
        "spoiler"
    }

    fn order(&self) -> u32 {
        order::SPOILER
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Spoiler]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        regex_capture(&SPOILER_RE, source)
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let content = capture.group(1).unwrap_or_default();
        vec![Node::Spoiler {
            children: parser.parse(content, &ctx.with_inline(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        html_tag(
            "span",
            &renderer.render(node.children(), ctx),
            &[("class", Some("d-spoiler".to_owned()))],
            true,
            ctx,
        )
    }
}

/// Every newline is a `<br>`, in any scope.
#[derive(Debug, Clone, Copy)]
pub struct LineBreak;

impl Rule for LineBreak {
    fn name(&self) -> &'static str {
        "br"
    }

    fn order(&self) -> u32 {
        order::LINE_BREAK
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::LineBreak]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        source.starts_with('\n').then(|| Capture::new(&source[..1]))
    }

    fn parse(&self, _capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::LineBreak]
    }

    fn render(&self, _node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        html_tag("br", "", &[], false, ctx)
    }
}
