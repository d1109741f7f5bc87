//! Per-call parse and render state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::ast::Node;
use crate::html::sanitize_text;

/// Nested parses deeper than this are kept as literal text.
pub const MAX_DEPTH: usize = 64;

/// Renders one Discord entity node into the text placed inside its element.
pub type Callback = Arc<dyn Fn(&Node) -> String + Send + Sync>;

/// Rendering hooks for the six Discord entities.
///
/// Each slot can be replaced independently; the rest keep their defaults.
/// Output of the mention slots is inserted into the HTML verbatim, so a
/// custom callback is responsible for escaping anything it interpolates.
/// The `emoji` slot returns the image URL and is attribute-escaped.
#[derive(Clone)]
pub struct MentionCallbacks {
    pub user: Callback,
    pub channel: Callback,
    pub role: Callback,
    pub everyone: Callback,
    pub here: Callback,
    pub emoji: Callback,
}

static DEFAULT_CALLBACKS: Lazy<MentionCallbacks> = Lazy::new(|| MentionCallbacks {
    user: Arc::new(|node| match node {
        Node::MentionUser { id } => format!("@{}", sanitize_text(id)),
        _ => String::new(),
    }),
    channel: Arc::new(|node| match node {
        Node::MentionChannel { id } => format!("#{}", sanitize_text(id)),
        _ => String::new(),
    }),
    role: Arc::new(|node| match node {
        Node::MentionRole { id } => format!("&{}", sanitize_text(id)),
        _ => String::new(),
    }),
    everyone: Arc::new(|_| "@everyone".to_owned()),
    here: Arc::new(|_| "@here".to_owned()),
    emoji: Arc::new(|node| match node {
        Node::Emoji { id, animated, .. } => format!(
            "https://cdn.discordapp.com/emojis/{id}.{}",
            if *animated { "gif" } else { "png" }
        ),
        _ => String::new(),
    }),
});

impl Default for MentionCallbacks {
    fn default() -> Self {
        DEFAULT_CALLBACKS.clone()
    }
}

impl fmt::Debug for MentionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionCallbacks").finish_non_exhaustive()
    }
}

impl MentionCallbacks {
    /// The shared default table.
    pub fn defaults() -> &'static MentionCallbacks {
        &DEFAULT_CALLBACKS
    }

    pub fn with_user(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.user = Arc::new(f);
        self
    }

    pub fn with_channel(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.channel = Arc::new(f);
        self
    }

    pub fn with_role(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.role = Arc::new(f);
        self
    }

    pub fn with_everyone(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.everyone = Arc::new(f);
        self
    }

    pub fn with_here(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.here = Arc::new(f);
        self
    }

    pub fn with_emoji(mut self, f: impl Fn(&Node) -> String + Send + Sync + 'static) -> Self {
        self.emoji = Arc::new(f);
        self
    }
}

/// Flags and borrowed configuration threaded through parsing and rendering.
///
/// `Context` is `Copy`. Rules never mutate it; they hand a derived copy to
/// the nested call, so whatever a child sets is gone once it returns.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub inline: bool,
    pub in_quote: bool,
    pub in_emphasis: bool,
    pub in_list: bool,
    pub escape_html: bool,
    pub css_module_names: Option<&'a HashMap<String, String>>,
    pub callbacks: &'a MentionCallbacks,
    /// Text of the previous successful capture at this recursion level.
    pub previous: Option<&'a str>,
    pub depth: usize,
}

impl Default for Context<'_> {
    fn default() -> Self {
        Context::new(MentionCallbacks::defaults())
    }
}

impl<'a> Context<'a> {
    pub fn new(callbacks: &'a MentionCallbacks) -> Self {
        Context {
            inline: false,
            in_quote: false,
            in_emphasis: false,
            in_list: false,
            escape_html: true,
            css_module_names: None,
            callbacks,
            previous: None,
            depth: 0,
        }
    }

    /// Entering inline scope also clears `in_list`, so a span inside a list
    /// item cannot open a list of its own.
    pub fn with_inline(self, inline: bool) -> Self {
        Context {
            inline,
            in_list: self.in_list && !inline,
            ..self
        }
    }

    pub fn with_quote(self, in_quote: bool) -> Self {
        Context { in_quote, ..self }
    }

    pub fn with_emphasis(self, in_emphasis: bool) -> Self {
        Context {
            in_emphasis,
            ..self
        }
    }

    pub fn with_list(self, in_list: bool) -> Self {
        Context { in_list, ..self }
    }

    pub fn with_escape_html(self, escape_html: bool) -> Self {
        Context {
            escape_html,
            ..self
        }
    }

    pub fn with_css_module_names(self, names: Option<&'a HashMap<String, String>>) -> Self {
        Context {
            css_module_names: names,
            ..self
        }
    }

    pub fn with_previous(self, previous: Option<&'a str>) -> Self {
        Context { previous, ..self }
    }

    /// One recursion level deeper.
    pub fn descend(self) -> Self {
        Context {
            depth: self.depth + 1,
            ..self
        }
    }

    pub fn too_deep(&self) -> bool {
        self.depth > MAX_DEPTH
    }

    /// True when the previous capture ended a line, or there was none.
    pub fn at_line_start(&self) -> bool {
        match self.previous {
            None => true,
            Some(prev) => {
                prev.is_empty() || prev.trim_end_matches(' ').ends_with('\n')
            }
        }
    }

    pub fn previous_text(&self) -> &'a str {
        self.previous.unwrap_or("")
    }
}
