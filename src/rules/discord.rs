//! Discord entities: mentions and custom emoji.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Capture, Rule, order};
use crate::ast::{Node, NodeKind};
use crate::context::Context;
use crate::html::html_tag;
use crate::parser::Parser;
use crate::renderer::HtmlRenderer;

static USER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>").unwrap());
static CHANNEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<#(\d+)>").unwrap());
static ROLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@&(\d+)>").unwrap());
static EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(a?):([A-Za-z0-9_]+):(\d+)>").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Channel,
    Role,
    Everyone,
    Here,
}

impl Entity {
    fn kind(self) -> NodeKind {
        match self {
            Entity::User => NodeKind::MentionUser,
            Entity::Channel => NodeKind::MentionChannel,
            Entity::Role => NodeKind::MentionRole,
            Entity::Everyone => NodeKind::MentionEveryone,
            Entity::Here => NodeKind::MentionHere,
        }
    }

    fn class(self) -> &'static str {
        match self {
            Entity::Channel => "d-mention d-channel",
            Entity::Role => "d-mention d-role",
            Entity::User | Entity::Everyone | Entity::Here => "d-mention d-user",
        }
    }
}

/// A mention of one entity kind, rendered as a `span` around the output of
/// the matching callback.
#[derive(Debug, Clone, Copy)]
pub struct Mention(pub Entity);

impl Rule for Mention {
    fn name(&self) -> &'static str {
        match self.0 {
            Entity::User => "discordUser",
            Entity::Channel => "discordChannel",
            Entity::Role => "discordRole",
            Entity::Everyone => "discordEveryone",
            Entity::Here => "discordHere",
        }
    }

    fn order(&self) -> u32 {
        order::ENTITY
    }

    fn renders(&self) -> &'static [NodeKind] {
        match self.0 {
            Entity::User => &[NodeKind::MentionUser],
            Entity::Channel => &[NodeKind::MentionChannel],
            Entity::Role => &[NodeKind::MentionRole],
            Entity::Everyone => &[NodeKind::MentionEveryone],
            Entity::Here => &[NodeKind::MentionHere],
        }
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        let literal = |word: &str| {
            source
                .starts_with(word)
                .then(|| Capture::new(&source[..word.len()]))
        };
        match self.0 {
            Entity::User => USER_RE.captures(source).map(|c| Capture::from_regex(&c)),
            Entity::Channel => CHANNEL_RE.captures(source).map(|c| Capture::from_regex(&c)),
            Entity::Role => ROLE_RE.captures(source).map(|c| Capture::from_regex(&c)),
            Entity::Everyone => literal("@everyone"),
            Entity::Here => literal("@here"),
        }
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        let id = capture.group(1).unwrap_or_default().to_owned();
        let node = match self.0 {
            Entity::User => Node::MentionUser { id },
            Entity::Channel => Node::MentionChannel { id },
            Entity::Role => Node::MentionRole { id },
            Entity::Everyone => Node::MentionEveryone,
            Entity::Here => Node::MentionHere,
        };
        vec![node]
    }

    fn render(&self, node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        if node.kind() != self.0.kind() {
            return String::new();
        }
        let callbacks = ctx.callbacks;
        let callback = match self.0 {
            Entity::User => &callbacks.user,
            Entity::Channel => &callbacks.channel,
            Entity::Role => &callbacks.role,
            Entity::Everyone => &callbacks.everyone,
            Entity::Here => &callbacks.here,
        };
        html_tag(
            "span",
            &callback(node),
            &[("class", Some(self.0.class().to_owned()))],
            true,
            ctx,
        )
    }
}

/// `<:name:id>` or `<a:name:id>` for animated emoji.
#[derive(Debug, Clone, Copy)]
pub struct Emoji;

impl Rule for Emoji {
    fn name(&self) -> &'static str {
        "discordEmoji"
    }

    fn order(&self) -> u32 {
        order::ENTITY
    }

    fn renders(&self) -> &'static [NodeKind] {
        &[NodeKind::Emoji]
    }

    fn capture<'s>(&self, source: &'s str, _ctx: &Context<'_>) -> Option<Capture<'s>> {
        EMOJI_RE
            .captures(source)
            .map(|caps| Capture::from_regex(&caps))
    }

    fn parse(&self, capture: &Capture<'_>, _parser: &Parser<'_>, _ctx: &Context<'_>) -> Vec<Node> {
        vec![Node::Emoji {
            animated: capture.group(1) == Some("a"),
            name: capture.group(2).unwrap_or_default().to_owned(),
            id: capture.group(3).unwrap_or_default().to_owned(),
        }]
    }

    fn render(&self, node: &Node, _renderer: &HtmlRenderer<'_>, ctx: &Context<'_>) -> String {
        let Node::Emoji { name, animated, .. } = node else {
            return String::new();
        };
        let class = if *animated {
            "d-emoji d-emoji-animated"
        } else {
            "d-emoji"
        };
        html_tag(
            "img",
            "",
            &[
                ("class", Some(class.to_owned())),
                ("src", Some((ctx.callbacks.emoji)(node))),
                ("alt", Some(format!(":{name}:"))),
            ],
            false,
            ctx,
        )
    }
}
