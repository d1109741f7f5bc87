//! Discord-flavoured Markdown to sanitized HTML.

pub mod ast;
pub mod context;
pub mod error;
pub mod html;
pub mod parser;
pub mod renderer;
pub mod rules;

use std::collections::HashMap;

use serde::Deserialize;

pub use ast::{Node, NodeKind};
pub use context::{Callback, Context, MAX_DEPTH, MentionCallbacks};
pub use error::Error;
pub use parser::Parser;
pub use renderer::HtmlRenderer;
pub use rules::{Profile, Rule, RuleSet, RuleSetBuilder};

/// Conversion options.
///
/// Deserializes from the camelCase JSON shape (`embed`, `discordOnly`,
/// `escapeHTML`, `cssModuleNames`); missing fields take their defaults.
/// Callbacks can only be set from code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Use the embed profile, which adds `[label](url)` links.
    pub embed: bool,
    /// Recognise Discord entities only. Takes precedence over `embed`.
    pub discord_only: bool,
    /// Escape text content. On by default.
    #[serde(rename = "escapeHTML", alias = "escapeHtml")]
    pub escape_html: bool,
    #[serde(skip)]
    pub callbacks: MentionCallbacks,
    /// Replacement names for the emitted css classes.
    pub css_module_names: Option<HashMap<String, String>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            embed: false,
            discord_only: false,
            escape_html: true,
            callbacks: MentionCallbacks::default(),
            css_module_names: None,
        }
    }
}

impl Options {
    pub fn profile(&self) -> Profile {
        if self.discord_only {
            Profile::MentionOnly
        } else if self.embed {
            Profile::Embed
        } else {
            Profile::Default
        }
    }

    /// Top-level context for one conversion.
    pub fn context(&self) -> Context<'_> {
        Context::new(&self.callbacks)
            .with_escape_html(self.escape_html)
            .with_css_module_names(self.css_module_names.as_ref())
    }
}

/// Convert `source` with the profile selected by `options`.
pub fn to_html(source: &str, options: &Options) -> String {
    let rules = options.profile().rules();
    convert(source, options, &Parser::new(rules), &HtmlRenderer::new(rules))
}

/// Convert `source` with a caller-supplied parser and renderer.
///
/// Both or neither must be given. With neither this is [`to_html`].
pub fn to_html_with(
    source: &str,
    options: &Options,
    parser: Option<&Parser<'_>>,
    renderer: Option<&HtmlRenderer<'_>>,
) -> Result<String, Error> {
    match (parser, renderer) {
        (Some(parser), Some(renderer)) => Ok(convert(source, options, parser, renderer)),
        (None, None) => Ok(to_html(source, options)),
        _ => Err(Error::IncompleteCustomProfile),
    }
}

/// Parse with the default profile and context, without rendering.
pub fn parse_only(source: &str) -> Vec<Node> {
    Parser::new(Profile::Default.rules()).parse(source, &Context::default())
}

/// Parse markdown text and render to HTML with default options
pub fn markdown_to_html(markdown: &str) -> String {
    to_html(markdown, &Options::default())
}

fn convert(
    source: &str,
    options: &Options,
    parser: &Parser<'_>,
    renderer: &HtmlRenderer<'_>,
) -> String {
    tracing::trace!(
        len = source.len(),
        profile = ?options.profile(),
        escape_html = options.escape_html,
        "Converting markdown"
    );
    let ctx = options.context();
    let ast = parser.parse(source, &ctx);
    renderer.render(&ast, &ctx)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html(""), "");
    }

    #[test]
    fn test_discord_only_wins_over_embed() {
        let options = Options {
            embed: true,
            discord_only: true,
            ..Options::default()
        };
        assert_eq!(options.profile(), Profile::MentionOnly);
        assert_eq!(
            to_html("**<@1>**\nx", &options),
            r#"**<span class="d-mention d-user">@1</span>**
x"#
        );
    }

    #[test]
    fn test_options_from_json() {
        let options: Options = serde_json::from_str(
            r#"{"embed": true, "escapeHTML": false, "cssModuleNames": {"d-user": "u"}}"#,
        )
        .unwrap();
        assert!(options.embed);
        assert!(!options.discord_only);
        assert!(!options.escape_html);
        assert_eq!(
            options.css_module_names.as_ref().and_then(|m| m.get("d-user")),
            Some(&"u".to_owned())
        );

        let defaults: Options = serde_json::from_str("{}").unwrap();
        assert!(defaults.escape_html);
        assert_eq!(defaults.profile(), Profile::Default);
    }

    #[test]
    fn test_custom_profile_needs_both_halves() {
        let rules = Profile::Default.rules();
        let parser = Parser::new(rules);
        let renderer = HtmlRenderer::new(rules);
        let options = Options::default();

        assert!(matches!(
            to_html_with("x", &options, Some(&parser), None),
            Err(Error::IncompleteCustomProfile)
        ));
        assert!(matches!(
            to_html_with("x", &options, None, Some(&renderer)),
            Err(Error::IncompleteCustomProfile)
        ));
        assert_eq!(
            to_html_with("**x**", &options, Some(&parser), Some(&renderer)).unwrap(),
            "<strong>x</strong>"
        );
        assert_eq!(to_html_with("**x**", &options, None, None).unwrap(), "<strong>x</strong>");
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = rules::base_rules().without("strong").build();
        let parser = Parser::new(&rules);
        let renderer = HtmlRenderer::new(&rules);
        let html = to_html_with("**x** *y*", &Options::default(), Some(&parser), Some(&renderer))
            .unwrap();
        assert_eq!(html, "**x** <em>y</em>");
    }

    #[test]
    fn test_parse_only() {
        assert_eq!(
            parse_only("@here"),
            vec![Node::MentionHere]
        );
    }
}
