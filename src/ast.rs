//! AST node types for Discord-flavored markdown.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    // Leaf text
    Text {
        content: String,
    },
    Emoticon {
        content: String,
    },
    // Inline formatting
    Emphasis {
        children: Vec<Node>,
    }, // <em>
    Strong {
        children: Vec<Node>,
    }, // <strong>
    Underline {
        children: Vec<Node>,
    }, // <u>
    Strike {
        children: Vec<Node>,
    }, // <del>
    Spoiler {
        children: Vec<Node>,
    },
    InlineCode {
        content: String,
    },
    /// Autolinks, bare urls and embed links share this shape.
    Link {
        children: Vec<Node>,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    LineBreak,
    // Block-level nodes
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String, // raw text, never escaped
    },
    BlockQuote {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        /// Number of the first bullet, saturated at `u64::MAX`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        items: Vec<Vec<Node>>, // one child sequence per item
    },
    Heading {
        level: u8,
        children: Vec<Node>,
    },
    // Discord entities
    MentionUser {
        id: String,
    },
    MentionChannel {
        id: String,
    },
    MentionRole {
        id: String,
    },
    MentionEveryone,
    MentionHere,
    Emoji {
        id: String,
        name: String,
        animated: bool,
    },
}

/// Discriminant of [`Node`], used to look up the rule that renders a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Emoticon,
    Emphasis,
    Strong,
    Underline,
    Strike,
    Spoiler,
    InlineCode,
    Link,
    LineBreak,
    CodeBlock,
    BlockQuote,
    List,
    Heading,
    MentionUser,
    MentionChannel,
    MentionRole,
    MentionEveryone,
    MentionHere,
    Emoji,
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text { .. } => NodeKind::Text,
            Node::Emoticon { .. } => NodeKind::Emoticon,
            Node::Emphasis { .. } => NodeKind::Emphasis,
            Node::Strong { .. } => NodeKind::Strong,
            Node::Underline { .. } => NodeKind::Underline,
            Node::Strike { .. } => NodeKind::Strike,
            Node::Spoiler { .. } => NodeKind::Spoiler,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::Link { .. } => NodeKind::Link,
            Node::LineBreak => NodeKind::LineBreak,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::BlockQuote { .. } => NodeKind::BlockQuote,
            Node::List { .. } => NodeKind::List,
            Node::Heading { .. } => NodeKind::Heading,
            Node::MentionUser { .. } => NodeKind::MentionUser,
            Node::MentionChannel { .. } => NodeKind::MentionChannel,
            Node::MentionRole { .. } => NodeKind::MentionRole,
            Node::MentionEveryone => NodeKind::MentionEveryone,
            Node::MentionHere => NodeKind::MentionHere,
            Node::Emoji { .. } => NodeKind::Emoji,
        }
    }

    /// Child nodes of container variants; empty for leaves and lists.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Underline { children }
            | Node::Strike { children }
            | Node::Spoiler { children }
            | Node::Link { children, .. }
            | Node::BlockQuote { children }
            | Node::Heading { children, .. } => children,
            _ => &[],
        }
    }
}
