//! Recursive-descent dispatcher over a rule table.

use crate::ast::Node;
use crate::context::Context;
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    rules: &'r RuleSet,
}

impl<'r> Parser<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Parser { rules }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    /// Parse `source` into nodes. Never fails: anything no rule claims ends
    /// up as text.
    ///
    /// Rules see `ctx` with `previous` set to the capture before theirs at
    /// this level; their nested parses run one level deeper and start from
    /// that same `previous`.
    pub fn parse(&self, source: &str, ctx: &Context<'_>) -> Vec<Node> {
        if source.is_empty() {
            return Vec::new();
        }
        if ctx.too_deep() {
            tracing::debug!(depth = ctx.depth, "Nesting limit reached, keeping source as text");
            return vec![Node::text(source)];
        }

        let mut nodes = Vec::new();
        let mut rest = source;
        let mut previous = ctx.previous;

        while !rest.is_empty() {
            let here = ctx.with_previous(previous);
            let found = self
                .rules
                .iter()
                .filter(|rule| rule.eligible(&here))
                .find_map(|rule| rule.capture(rest, &here).map(|capture| (rule, capture)));

            let consumed = match found {
                Some((rule, capture)) => {
                    assert!(
                        !capture.is_empty(),
                        "rule `{}` produced a zero-length capture",
                        rule.name()
                    );
                    debug_assert!(rest.starts_with(capture.matched()));
                    nodes.extend(rule.parse(&capture, self, &here.descend()));
                    capture.matched()
                }
                None => {
                    // only reachable with a custom table that has no text rule
                    let width = rest.chars().next().map_or(rest.len(), char::len_utf8);
                    tracing::warn!("No rule matched, consuming one character as text");
                    nodes.push(Node::text(&rest[..width]));
                    &rest[..width]
                }
            };

            rest = &rest[consumed.len()..];
            previous = Some(consumed);
        }

        nodes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::MAX_DEPTH;
    use crate::rules::{Profile, inline};

    fn parse(source: &str) -> Vec<Node> {
        Parser::new(Profile::Default.rules()).parse(source, &Context::default())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), vec![]);
    }

    #[test]
    fn test_plain_text_is_one_node() {
        assert_eq!(parse("hello world"), vec![Node::text("hello world")]);
    }

    #[test]
    fn test_text_splits_at_punctuation_and_newline() {
        assert_eq!(
            parse("hi there.\nnext"),
            vec![
                Node::text("hi there"),
                Node::text("."),
                Node::LineBreak,
                Node::text("next"),
            ]
        );
    }

    #[test]
    fn test_nested_formatting() {
        assert_eq!(
            parse("**bold _both_**"),
            vec![Node::Strong {
                children: vec![
                    Node::text("bold "),
                    Node::Emphasis {
                        children: vec![Node::text("both")]
                    },
                ]
            }]
        );
    }

    #[test]
    fn test_emphasis_inside_emphasis_collapses() {
        assert_eq!(
            parse("*a _b_ c*"),
            vec![Node::Emphasis {
                children: vec![Node::text("a "), Node::text("b"), Node::text(" c")]
            }]
        );
    }

    #[test]
    fn test_flags_do_not_leak_to_siblings() {
        // the quote sets in_quote for its own content only
        let nodes = parse("> a\n> b\n\n> c");
        let quotes = nodes
            .iter()
            .filter(|n| matches!(n, Node::BlockQuote { .. }))
            .count();
        assert_eq!(quotes, 2);
    }

    #[test]
    fn test_inline_context_blocks_block_rules() {
        let nodes = parse("||> not a quote||");
        assert_eq!(
            nodes,
            vec![Node::Spoiler {
                children: vec![Node::text("> not a quote")]
            }]
        );
    }

    #[test]
    fn test_depth_limit_falls_back_to_text() {
        let source = format!("{}x", "- ".repeat(MAX_DEPTH * 2));
        let nodes = parse(&source);
        let mut depth = 0;
        let mut current = &nodes;
        while let [Node::List { items, .. }] = current.as_slice() {
            depth += 1;
            current = &items[0];
        }
        assert!(depth <= MAX_DEPTH + 1);
        assert!(matches!(current.as_slice(), [Node::Text { .. }]));
    }

    #[test]
    fn test_missing_text_rule_still_covers_input() {
        let rules = crate::rules::RuleSet::builder().with(inline::LineBreak).build();
        let nodes = Parser::new(&rules).parse("a\nb", &Context::default());
        assert_eq!(
            nodes,
            vec![Node::text("a"), Node::LineBreak, Node::text("b")]
        );
    }
}
