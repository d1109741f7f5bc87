//! HTML renderer driven by a rule table.

use crate::ast::Node;
use crate::context::Context;
use crate::rules::RuleSet;

/// Turns nodes back into HTML by handing each one to the rule that owns its
/// kind in the table.
#[derive(Debug, Clone, Copy)]
pub struct HtmlRenderer<'r> {
    rules: &'r RuleSet,
}

impl<'r> HtmlRenderer<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        HtmlRenderer { rules }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    pub fn render(&self, nodes: &[Node], ctx: &Context<'_>) -> String {
        nodes.iter().map(|node| self.render_node(node, ctx)).collect()
    }

    pub fn render_node(&self, node: &Node, ctx: &Context<'_>) -> String {
        match self.rules.renderer_for(node.kind()) {
            Some(rule) => rule.render(node, self, ctx),
            None => {
                tracing::warn!(kind = ?node.kind(), "No rule renders this node kind");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::Parser;
    use crate::rules::Profile;

    fn render(source: &str, ctx: &Context<'_>) -> String {
        let rules = Profile::Default.rules();
        let nodes = Parser::new(rules).parse(source, ctx);
        HtmlRenderer::new(rules).render(&nodes, ctx)
    }

    #[test]
    fn test_formatting() {
        let ctx = Context::default();
        assert_eq!(render("**test**", &ctx), "<strong>test</strong>");
        assert_eq!(render("*test*", &ctx), "<em>test</em>");
        assert_eq!(render("_test_", &ctx), "<em>test</em>");
        assert_eq!(render("__test__", &ctx), "<u>test</u>");
        assert_eq!(render("~~a~~", &ctx), "<del>a</del>");
        assert_eq!(
            render("||secret||", &ctx),
            r#"<span class="d-spoiler">secret</span>"#
        );
    }

    #[test]
    fn test_escaping_follows_context() {
        let ctx = Context::default();
        assert_eq!(render("<b>test</b>", &ctx), "&lt;b&gt;test&lt;/b&gt;");
        let raw = ctx.with_escape_html(false);
        assert_eq!(render("<b>test</b>", &raw), "<b>test</b>");
    }

    #[test]
    fn test_inline_code_always_escaped() {
        let raw = Context::default().with_escape_html(false);
        assert_eq!(render("` <i> `", &raw), "<code>&lt;i&gt;</code>");
    }

    #[test]
    fn test_list_start_attribute() {
        let ctx = Context::default();
        assert_eq!(
            render("3. a\n4. b", &ctx),
            r#"<ol start="3"><li>a</li><li>b</li></ol>"#
        );
        assert_eq!(render("0. a", &ctx), "<ol><li>a</li></ol>");
        assert_eq!(render("- a", &ctx), "<ul><li>a</li></ul>");
    }

    #[test]
    fn test_unsafe_link_loses_href() {
        let ctx = Context::default();
        assert_eq!(
            render("<javascript:/alert(1)>", &ctx),
            "<a>javascript:/alert(1)</a>"
        );
    }

    #[test]
    fn test_class_names_remapped() {
        let names: HashMap<String, String> = [("d-spoiler".to_owned(), "s_1".to_owned())]
            .into_iter()
            .collect();
        let ctx = Context::default().with_css_module_names(Some(&names));
        assert_eq!(
            render("||x||", &ctx),
            r#"<span class="s_1">x</span>"#
        );
    }

    #[test]
    fn test_unowned_kind_renders_empty() {
        let rules = Profile::MentionOnly.rules();
        let nodes = vec![
            Node::text("a"),
            Node::Strong {
                children: vec![Node::text("b")],
            },
        ];
        assert_eq!(
            HtmlRenderer::new(rules).render(&nodes, &Context::default()),
            "a"
        );
    }
}
