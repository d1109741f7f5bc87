//! Line-level constructs: quotes, lists, fenced code and headings.

use std::borrow::Cow;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Capture, Rule, Scope, order};
use crate::ast::{Node, NodeKind};
use crate::context::Context;
use crate::html::html_tag;
use crate::parser::Parser;
use crate::renderer::HtmlRenderer;

static QUOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^( *>>> ([\s\S]*))|^( *> [^\n]*(\n *> [^\n]*)*\n?)").unwrap()
});
static QUOTE_BLOCK_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ *>>> ?").unwrap());
static QUOTE_LINE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ *> ?").unwrap());
static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^```(?:([a-z0-9-]+?)\n+)?\n*([\s\S]+?)\n*```").unwrap()
});
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ *(#+) ([^\n#]+)#*\n?").unwrap());
static HASHES_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ *#+$").unwrap());

/// `> line` runs, or `>>> ` which quotes everything after it.
#[derive(Debug, Clone, Copy)]
pub struct BlockQuote;

impl Rule for BlockQuote {
    fn name(&self) -> &'static str {
        "blockQuote"
    }

    fn order(&self) -> u32 {
        order::BLOCK_QUOTE
    }

    fn scope(&self) -> Scope {
        Scope::Block
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::BlockQuote]
    }

    fn eligible(&self, ctx: &Context<'_>) -> bool {
        !ctx.inline && !ctx.in_quote && ctx.at_line_start()
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        QUOTE_RE
            .captures(source)
            .map(|caps| Capture::from_regex(&caps))
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let all = capture.matched();
        let content = if QUOTE_BLOCK_MARKER_RE.is_match(all) {
            QUOTE_BLOCK_MARKER_RE.replace(all, "")
        } else {
            QUOTE_LINE_MARKER_RE.replace_all(all, "")
        };
        vec![Node::BlockQuote {
            children: parser.parse(&content, &ctx.with_quote(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        html_tag(
            "blockquote",
            &renderer.render(node.children(), ctx),
            &[],
            true,
            ctx,
        )
    }
}

/// Width of the bullet at the head of `s`: `*`, `-` or `digits.`.
fn bullet_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes.first()? {
        b'*' | b'-' => Some(1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            (bytes.get(digits) == Some(&b'.')).then_some(digits + 1)
        }
        _ => None,
    }
}

/// True when `s` opens an item at exactly `indent` spaces: indent, bullet,
/// one space.
fn opens_item(s: &str, indent: usize) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < indent || bytes[..indent].iter().any(|&b| b != b' ') {
        return false;
    }
    let rest = &s[indent..];
    bullet_len(rest).is_some_and(|len| rest.as_bytes().get(len) == Some(&b' '))
}

/// Width of the item prefix: indentation, bullet and every following space.
fn item_prefix_len(item: &str) -> usize {
    let indent = item.bytes().take_while(|&b| b == b' ').count();
    let Some(bullet) = bullet_len(&item[indent..]) else {
        return 0;
    };
    let spaces = item[indent + bullet..]
        .bytes()
        .take_while(|&b| b == b' ')
        .count();
    indent + bullet + spaces
}

fn line_end(s: &str, from: usize) -> usize {
    s[from..].find('\n').map_or(s.len(), |i| from + i)
}

/// End of the list opening `block`, or `None` when `block` does not start
/// with an item.
///
/// After the first content character the list ends at the first point
/// where either a run of two or more newlines starts, or a single newline
/// is followed by neither a space nor a sibling bullet, or only whitespace
/// remains. The newline run is part of the list.
fn list_end(block: &str) -> Option<usize> {
    let indent = block.bytes().take_while(|&b| b == b' ').count();
    let bullet = bullet_len(&block[indent..])?;
    let content = indent + bullet;
    if block.as_bytes().get(content) != Some(&b' ') {
        return None;
    }
    let first = block[content + 1..].chars().next()?;
    let bytes = block.as_bytes();
    let tail = block.trim_end().len();

    let mut i = content + 1 + first.len_utf8();
    while i <= block.len() {
        if bytes.get(i) == Some(&b'\n') {
            let run = bytes[i..].iter().take_while(|&&b| b == b'\n').count();
            let after = &block[i + run..];
            if run >= 2 || !(after.starts_with(' ') || opens_item(after, indent)) {
                return Some(i + run);
            }
        }
        if i >= tail {
            return Some(block.len());
        }
        i += block[i..].chars().next().map_or(1, char::len_utf8);
    }
    Some(block.len())
}

/// Cut a list block into items. An item runs until a line that opens a
/// sibling at the same indentation, and takes one trailing newline.
fn split_items(block: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    while start < block.len() {
        let indent = block[start..].bytes().take_while(|&b| b == b' ').count();
        let mut end = line_end(block, start);
        while end < block.len() && !opens_item(&block[end + 1..], indent) {
            end = line_end(block, end + 1);
        }
        if end < block.len() {
            end += 1;
        }
        items.push(&block[start..end]);
        start = end;
    }
    items
}

/// Strip up to `width` leading spaces from every line, then the prefix.
fn item_content(item: &str) -> String {
    let width = item_prefix_len(item);
    let dedented = item
        .split('\n')
        .map(|line| {
            let spaces = line.bytes().take(width).take_while(|&b| b == b' ').count();
            &line[spaces..]
        })
        .collect::<Vec<_>>()
        .join("\n");
    let prefix = item_prefix_len(&dedented);
    dedented[prefix..].to_owned()
}

/// Drop ` *\n+` at the end.
fn trim_item_end(content: &str) -> &str {
    let without_newlines = content.trim_end_matches('\n');
    if without_newlines.len() == content.len() {
        content
    } else {
        without_newlines.trim_end_matches(' ')
    }
}

/// Bulleted or numbered list.
///
/// Only fires after a line break (or a quote marker), possibly followed by
/// spaces. Those spaces were already consumed by the previous capture; they
/// count toward the list's indentation but are not consumed again.
#[derive(Debug, Clone, Copy)]
pub struct List;

impl List {
    fn leading_spaces<'p>(previous: &'p str) -> Option<&'p str> {
        let trimmed = previous.trim_end_matches(' ');
        let at_start = trimmed.is_empty()
            || trimmed.ends_with('\n')
            || trimmed.ends_with("\n>")
            || trimmed.ends_with("\n>>>");
        at_start.then(|| &previous[trimmed.len()..])
    }
}

impl Rule for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn order(&self) -> u32 {
        order::LIST
    }

    fn scope(&self) -> Scope {
        Scope::Block
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::List]
    }

    fn eligible(&self, ctx: &Context<'_>) -> bool {
        !ctx.inline || ctx.in_list
    }

    fn capture<'s>(&self, source: &'s str, ctx: &Context<'_>) -> Option<Capture<'s>> {
        let prefix = List::leading_spaces(ctx.previous_text())?;
        let block: Cow<'s, str> = if prefix.is_empty() {
            Cow::Borrowed(source)
        } else {
            Cow::Owned(format!("{prefix}{source}"))
        };
        let end = list_end(&block)?;
        let matched = &source[..end - prefix.len()];
        let text = match block {
            Cow::Borrowed(s) => Cow::Borrowed(&s[..end]),
            Cow::Owned(mut s) => {
                s.truncate(end);
                Cow::Owned(s)
            }
        };
        Some(Capture::with_groups(matched, vec![Some(text)]))
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let block = capture.group(1).unwrap_or_else(|| capture.matched());
        let indent = block.bytes().take_while(|&b| b == b' ').count();
        let bullet = &block[indent..indent + bullet_len(&block[indent..]).unwrap_or(0)];
        let ordered = bullet.len() > 1;
        let start = ordered.then(|| {
            let digits = bullet.trim_end_matches('.');
            digits.parse::<u64>().unwrap_or_else(|_| {
                tracing::debug!(marker = digits, "List start out of range, saturating");
                u64::MAX
            })
        });

        let item_ctx = ctx.with_list(true);
        let raw_items = split_items(block);
        let last = raw_items.len().saturating_sub(1);
        let mut previous_loose = false;
        let items = raw_items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let content = item_content(item);
                let loose = content.contains("\n\n") || (i == last && previous_loose);
                previous_loose = loose;
                let content = if loose {
                    content.as_str()
                } else {
                    trim_item_end(&content)
                };
                parser.parse(content, &item_ctx)
            })
            .collect();

        vec![Node::List {
            ordered,
            start,
            items,
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        let Node::List {
            ordered,
            start,
            items,
        } = node
        else {
            return String::new();
        };
        let body: String = items
            .iter()
            .map(|item| html_tag("li", &renderer.render(item, ctx), &[], true, ctx))
            .collect();
        if *ordered {
            let start = start.filter(|&n| n != 0).map(|n| n.to_string());
            html_tag("ol", &body, &[("start", start)], true, ctx)
        } else {
            html_tag("ul", &body, &[], true, ctx)
        }
    }
}

/// Fenced code. The body travels base64-encoded in `data-code` so the raw
/// text never reaches the element content.
#[derive(Debug, Clone, Copy)]
pub struct CodeBlock;

impl Rule for CodeBlock {
    fn name(&self) -> &'static str {
        "codeBlock"
    }

    fn order(&self) -> u32 {
        order::CODE_BLOCK
    }

    fn scope(&self) -> Scope {
        Scope::Block
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::CodeBlock]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        CODE_BLOCK_RE
            .captures(source)
            .map(|caps| Capture::from_regex(&caps))
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        let language = capture
            .group(1)
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_owned);
        vec![Node::CodeBlock {
            language,
            content: capture.group(2).unwrap_or_default().to_owned(),
        }]
    }

    fn render(&self, node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        let Node::CodeBlock { language, content } = node else {
            return String::new();
        };
        let code = html_tag(
            "code",
            "",
            &[
                ("data-code", Some(BASE64_STANDARD.encode(content))),
                ("data-code-language", language.clone()),
            ],
            true,
            ctx,
        );
        html_tag("pre", &code, &[], true, ctx)
    }
}

/// `#`, `##` and `###` headings. Message bodies only.
#[derive(Debug, Clone, Copy)]
pub struct Heading;

impl Rule for Heading {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn order(&self) -> u32 {
        order::HEADING
    }

    fn scope(&self) -> Scope {
        Scope::Block
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Heading]
    }

    fn capture<'s>(&self, source: &'s str, ctx: &Context<'_>) -> Option<Capture<'s>> {
        if !ctx.at_line_start() || HASHES_ONLY_RE.is_match(ctx.previous_text()) {
            return None;
        }
        let caps = HEADING_RE.captures(source)?;
        let level = caps.get(1).map_or(0, |m| m.len());
        (level <= 3).then(|| Capture::from_regex(&caps))
    }

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node> {
        let level = capture.group(1).map_or(1, str::len);
        let content = capture.group(2).unwrap_or_default().trim();
        vec![Node::Heading {
            level: level as u8,
            children: parser.parse(content, &ctx.with_inline(true)),
        }]
    }

    fn render(&self, node: &Node, renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        let Node::Heading { level, children } = node else {
            return String::new();
        };
        html_tag(
            &format!("h{level}"),
            &renderer.render(children, ctx),
            &[],
            true,
            ctx,
        )
    }
}
