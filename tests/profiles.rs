//! Behaviour shared or split across the prebuilt profiles.

use dismark::{MentionCallbacks, Node, Options, Profile, to_html};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn options_for(profile: Profile) -> Options {
    Options {
        embed: profile == Profile::Embed,
        discord_only: profile == Profile::MentionOnly,
        ..Options::default()
    }
}

#[rstest(profile => [Profile::Default, Profile::Embed, Profile::MentionOnly])]
fn mentions_render_in_every_profile(profile: Profile) {
    let html = to_html("<@42> <#7> <@&9> <a:dance:5>", &options_for(profile));
    assert_eq!(
        html,
        concat!(
            r#"<span class="d-mention d-user">@42</span> "#,
            r#"<span class="d-mention d-channel">#7</span> "#,
            r#"<span class="d-mention d-role">&9</span> "#,
            r#"<img class="d-emoji d-emoji-animated" src="https://cdn.discordapp.com/emojis/5.gif" alt=":dance:">"#,
        )
    );
}

#[rstest(profile => [Profile::Default, Profile::Embed, Profile::MentionOnly])]
fn escaping_applies_in_every_profile(profile: Profile) {
    assert_eq!(
        to_html("<i>&</i>", &options_for(profile)),
        "&lt;i&gt;&amp;&lt;/i&gt;"
    );
    let raw = Options {
        escape_html: false,
        ..options_for(profile)
    };
    assert_eq!(to_html("<i>&</i>", &raw), "<i>&</i>");
}

#[rstest(profile => [Profile::Default, Profile::Embed])]
fn formatting_shared_by_message_and_embed(profile: Profile) {
    assert_eq!(
        to_html("**a** _b_ __c__ ~~d~~ `e`\n> f", &options_for(profile)),
        "<strong>a</strong> <em>b</em> <u>c</u> <del>d</del> <code>e</code><br><blockquote>f</blockquote>"
    );
}

#[rstest(
    source,
    expected,
    case("# a", "<h1>a</h1>"),
    case("[a](/b)", "[a](/b)"),
    case("a\nb", "a<br>b")
)]
fn message_profile(source: &str, expected: &str) {
    assert_eq!(to_html(source, &options_for(Profile::Default)), expected);
}

#[rstest(
    source,
    expected,
    case("# a", "# a"),
    case("[a](/b)", r#"<a href="/b">a</a>"#),
    case("[a](<https://x.y>)", r#"<a href="https://x.y">a</a>"#)
)]
fn embed_profile(source: &str, expected: &str) {
    assert_eq!(to_html(source, &options_for(Profile::Embed)), expected);
}

#[rstest(
    source,
    case("**a**"),
    case("> quote"),
    case("- item"),
    case("a\nb"),
    case("```code```")
)]
fn mention_only_leaves_markup_alone(source: &str) {
    let options = Options {
        escape_html: false,
        ..options_for(Profile::MentionOnly)
    };
    assert_eq!(to_html(source, &options), source);
}

#[test]
fn custom_callbacks_replace_only_their_slot() {
    let options = Options {
        callbacks: MentionCallbacks::default()
            .with_user(|node| match node {
                Node::MentionUser { id } if id == "1" => "Wumpus".to_owned(),
                _ => "unknown".to_owned(),
            })
            .with_here(|_| "online".to_owned()),
        ..Options::default()
    };
    assert_eq!(
        to_html("<@1> <@2> @here @everyone", &options),
        concat!(
            r#"<span class="d-mention d-user">Wumpus</span> "#,
            r#"<span class="d-mention d-user">unknown</span> "#,
            r#"<span class="d-mention d-user">online</span> "#,
            r#"<span class="d-mention d-user">@everyone</span>"#,
        )
    );
}
