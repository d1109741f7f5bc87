//! HTML escaping, URL filtering and element assembly.

use once_cell::sync::Lazy;
use url::Url;

use crate::context::Context;

static URL_BASE: Lazy<Option<Url>> = Lazy::new(|| Url::parse("https://localhost/").ok());

const UNSAFE_SCHEMES: [&str; 3] = ["javascript", "vbscript", "data"];

/// Escape text for an HTML body or a double-quoted attribute value.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Check a link target for use in `href`.
///
/// The target is resolved against `https://localhost/` so relative links
/// survive. Returns `None` for script-capable schemes and for targets the
/// URL parser rejects.
pub fn sanitize_url(target: &str) -> Option<String> {
    let parsed = Url::options()
        .base_url((*URL_BASE).as_ref())
        .parse(target)
        .ok()?;
    if UNSAFE_SCHEMES.contains(&parsed.scheme()) {
        tracing::debug!(scheme = parsed.scheme(), "Dropping unsafe link target");
        return None;
    }
    Some(target.to_owned())
}

/// Build an element string.
///
/// Attributes with no value, or an empty one, are left out. When the
/// context carries a css module map, each token of a `class` attribute is
/// replaced by its mapped name; unknown tokens pass through. `closed = false`
/// produces only the opening tag, for void elements.
pub fn html_tag(
    name: &str,
    content: &str,
    attributes: &[(&str, Option<String>)],
    closed: bool,
    ctx: &Context<'_>,
) -> String {
    let mut out = format!("<{name}");
    for (attr, value) in attributes {
        let Some(value) = value.as_deref().filter(|v| !v.is_empty()) else {
            continue;
        };
        let value = match (*attr, ctx.css_module_names) {
            ("class", Some(names)) => value
                .split(' ')
                .map(|class| names.get(class).map_or(class, String::as_str))
                .collect::<Vec<_>>()
                .join(" "),
            _ => value.to_owned(),
        };
        out.push_str(&format!(
            " {}=\"{}\"",
            sanitize_text(attr),
            sanitize_text(&value)
        ));
    }
    out.push('>');
    if closed {
        out.push_str(content);
        out.push_str(&format!("</{name}>"));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(
            sanitize_text(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_sanitize_url_allows_web_and_relative() {
        assert_eq!(
            sanitize_url("https://example.com/a?b=c").as_deref(),
            Some("https://example.com/a?b=c")
        );
        assert_eq!(sanitize_url("/relative").as_deref(), Some("/relative"));
        assert_eq!(
            sanitize_url("mailto:someone@example.com").as_deref(),
            Some("mailto:someone@example.com")
        );
    }

    #[test]
    fn test_sanitize_url_rejects_script_schemes() {
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
        assert_eq!(sanitize_url("JaVaScRiPt:alert(1)"), None);
        assert_eq!(sanitize_url(" javascript:alert(1)"), None);
        assert_eq!(sanitize_url("vbscript:msgbox"), None);
        assert_eq!(sanitize_url("data:text/html;base64,AAAA"), None);
    }

    #[test]
    fn test_tag_drops_empty_attributes() {
        let ctx = Context::default();
        let html = html_tag(
            "a",
            "x",
            &[
                ("href", Some("/y".to_owned())),
                ("title", None),
                ("rel", Some(String::new())),
            ],
            true,
            &ctx,
        );
        assert_eq!(html, r#"<a href="/y">x</a>"#);
    }

    #[test]
    fn test_tag_escapes_attribute_values() {
        let ctx = Context::default();
        let html = html_tag("a", "", &[("title", Some("\"><b>".into()))], true, &ctx);
        assert_eq!(html, r#"<a title="&quot;&gt;&lt;b&gt;"></a>"#);
    }

    #[test]
    fn test_tag_unclosed() {
        let ctx = Context::default();
        let html = html_tag("img", "", &[("src", Some("a.png".into()))], false, &ctx);
        assert_eq!(html, r#"<img src="a.png">"#);
    }

    #[test]
    fn test_tag_class_remap() {
        let names: HashMap<String, String> =
            [("d-mention".to_owned(), "m_1".to_owned())].into_iter().collect();
        let ctx = Context::default().with_css_module_names(Some(&names));
        let html = html_tag(
            "span",
            "@x",
            &[("class", Some("d-mention d-user".into()))],
            true,
            &ctx,
        );
        assert_eq!(html, r#"<span class="m_1 d-user">@x</span>"#);
    }
}
