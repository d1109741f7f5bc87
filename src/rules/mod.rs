//! Grammar rule table.
//!
//! A [`Rule`] knows how to recognise one construct at the head of the
//! remaining source, turn the capture into nodes, and render the node kinds
//! it owns. A [`RuleSet`] is an ordered, immutable collection of rules; the
//! [`Parser`] tries them in order and the [`HtmlRenderer`] dispatches on it.
//!
//! Three profiles are prebuilt and shared process-wide, see [`Profile`].

pub mod block;
pub mod discord;
pub mod inline;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Captures;

use crate::ast::{Node, NodeKind};
use crate::context::Context;
use crate::parser::Parser;
use crate::renderer::HtmlRenderer;

/// Rule priorities. Lower runs first; equal values keep declaration order.
pub mod order {
    pub const HEADING: u32 = 0;
    pub const SPOILER: u32 = 0;
    pub const CODE_BLOCK: u32 = 4;
    pub const BLOCK_QUOTE: u32 = 6;
    pub const LIST: u32 = 7;
    pub const EMOTICON: u32 = 12;
    pub const ESCAPE: u32 = 13;
    pub const AUTOLINK: u32 = 14;
    pub const URL: u32 = 16;
    pub const LINK: u32 = 17;
    pub const EMPHASIS: u32 = 21;
    pub const STRONG: u32 = 21;
    pub const UNDERLINE: u32 = 21;
    pub const ENTITY: u32 = STRONG;
    pub const STRIKE: u32 = 22;
    pub const INLINE_CODE: u32 = 23;
    pub const LINE_BREAK: u32 = 24;
    pub const TEXT: u32 = 25;
}

/// The part of the remaining source a rule consumed, plus its groups.
#[derive(Debug, Clone)]
pub struct Capture<'s> {
    matched: &'s str,
    groups: Vec<Option<Cow<'s, str>>>,
}

impl<'s> Capture<'s> {
    pub fn new(matched: &'s str) -> Self {
        Capture {
            matched,
            groups: Vec::new(),
        }
    }

    pub fn with_groups(matched: &'s str, groups: Vec<Option<Cow<'s, str>>>) -> Self {
        Capture { matched, groups }
    }

    /// Whole match consumed, groups numbered as in the pattern.
    pub fn from_regex(caps: &Captures<'s>) -> Self {
        Capture {
            matched: caps.get(0).map_or("", |m| m.as_str()),
            groups: caps
                .iter()
                .skip(1)
                .map(|g| g.map(|m| Cow::Borrowed(m.as_str())))
                .collect(),
        }
    }

    /// For patterns written as `^(body)(guard)`: only group 1 is consumed,
    /// the guard just has to match, and the body's inner groups are
    /// renumbered from 1.
    pub fn guarded(caps: &Captures<'s>) -> Self {
        Capture {
            matched: caps.get(1).map_or("", |m| m.as_str()),
            groups: caps
                .iter()
                .skip(2)
                .map(|g| g.map(|m| Cow::Borrowed(m.as_str())))
                .collect(),
        }
    }

    pub fn matched(&self) -> &'s str {
        self.matched
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Group `index`, counting from 1.
    pub fn group(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.as_deref())
    }
}

/// Where a rule may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only while the context is not inline.
    Block,
    Any,
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn order(&self) -> u32;

    fn scope(&self) -> Scope {
        Scope::Any
    }

    /// Node kinds this rule renders.
    fn renders(&self) -> &'static [NodeKind] {
        &[]
    }

    fn eligible(&self, ctx: &Context<'_>) -> bool {
        self.scope() == Scope::Any || !ctx.inline
    }

    /// Recognise the construct at the start of `source`.
    ///
    /// `ctx.previous` holds the previous capture at this level. A returned
    /// capture must consume at least one character.
    fn capture<'s>(&self, source: &'s str, ctx: &Context<'_>) -> Option<Capture<'s>>;

    fn parse(&self, capture: &Capture<'_>, parser: &Parser<'_>, ctx: &Context<'_>) -> Vec<Node>;

    fn render(&self, _node: &Node, _renderer: &HtmlRenderer<'_>, _ctx: &Context<'_>) -> String {
        String::new()
    }
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name())
            .field("order", &self.order())
            .finish()
    }
}

/// An ordered, immutable rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
    renderers: HashMap<NodeKind, usize>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Start a new table from this one.
    pub fn to_builder(&self) -> RuleSetBuilder {
        RuleSetBuilder {
            rules: self.rules.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.iter().find(|rule| rule.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule, in table order, that renders `kind`.
    pub fn renderer_for(&self, kind: NodeKind) -> Option<&dyn Rule> {
        self.renderers
            .get(&kind)
            .map(|&index| self.rules[index].as_ref())
    }
}

#[derive(Default)]
pub struct RuleSetBuilder {
    rules: Vec<Arc<dyn Rule>>,
}

impl fmt::Debug for RuleSetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

impl RuleSetBuilder {
    /// Add a rule. A rule with the same name is replaced in place, keeping
    /// its declaration position.
    pub fn with(mut self, rule: impl Rule + 'static) -> Self {
        self.push(Arc::new(rule));
        self
    }

    pub fn with_shared(mut self, rule: Arc<dyn Rule>) -> Self {
        self.push(rule);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.rules.retain(|rule| rule.name() != name);
        self
    }

    fn push(&mut self, rule: Arc<dyn Rule>) {
        match self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn build(mut self) -> RuleSet {
        // stable: ties stay in declaration order
        self.rules.sort_by_key(|rule| rule.order());
        let mut renderers = HashMap::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for &kind in rule.renders() {
                renderers.entry(kind).or_insert(index);
            }
        }
        RuleSet {
            rules: self.rules,
            renderers,
        }
    }
}

/// The six Discord entity rules.
fn entity_rules(builder: RuleSetBuilder) -> RuleSetBuilder {
    use discord::{Emoji, Entity, Mention};
    builder
        .with(Mention(Entity::User))
        .with(Mention(Entity::Channel))
        .with(Mention(Entity::Role))
        .with(Emoji)
        .with(Mention(Entity::Everyone))
        .with(Mention(Entity::Here))
}

/// Rules shared by the message body and embed profiles.
pub fn base_rules() -> RuleSetBuilder {
    let builder = RuleSet::builder()
        .with(block::BlockQuote)
        .with(block::List)
        .with(block::CodeBlock)
        .with(inline::Emoticon)
        .with(inline::Escape)
        .with(inline::Autolink)
        .with(inline::Url)
        .with(inline::Emphasis)
        .with(inline::Strong)
        .with(inline::Underline);
    entity_rules(builder)
        .with(inline::Strike)
        .with(inline::InlineCode)
        .with(inline::Spoiler)
        .with(inline::LineBreak)
        .with(inline::Text)
}

static DEFAULT_RULES: Lazy<RuleSet> = Lazy::new(|| {
    let builder = RuleSet::builder().with(block::Heading);
    base_rules()
        .rules
        .into_iter()
        .fold(builder, RuleSetBuilder::with_shared)
        .build()
});

static EMBED_RULES: Lazy<RuleSet> = Lazy::new(|| base_rules().with(inline::Link).build());

static MENTION_ONLY_RULES: Lazy<RuleSet> =
    Lazy::new(|| entity_rules(RuleSet::builder()).with(inline::Text).build());

/// Prebuilt rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Message bodies: every construct plus headings, no labelled links.
    #[default]
    Default,
    /// Embeds: labelled `[text](url)` links, no headings.
    Embed,
    /// Discord entities and literal text only.
    MentionOnly,
}

impl Profile {
    pub fn rules(self) -> &'static RuleSet {
        match self {
            Profile::Default => &DEFAULT_RULES,
            Profile::Embed => &EMBED_RULES,
            Profile::MentionOnly => &MENTION_ONLY_RULES,
        }
    }
}
