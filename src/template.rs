//! Message rendering for everything posted to the group.
//!
//! Templates produce Telegram HTML. Values that come from members or the
//! text service go through the `tg` filter, which escapes them for HTML
//! parse mode; fixed titles and bars are emitted as-is.

use minijinja::{Environment, context};
use serde::Serialize;

use crate::messenger::{Participant, escape_html};
use crate::streak::LeaderboardEntry;

const LEADERBOARD_TEMPLATE: &str = include_str!("templates/leaderboard.html.jinja");
const RESET_TEMPLATE: &str = include_str!("templates/reset.html.jinja");
const MOTIVATION_TEMPLATE: &str = include_str!("templates/motivation.html.jinja");
const BANNER_TEMPLATE: &str = include_str!("templates/banner.html.jinja");
const MENTIONS_TEMPLATE: &str = include_str!("templates/mentions.html.jinja");

/// Context for the start-of-cycle banner.
#[derive(Debug, Serialize)]
pub struct BannerContext<'a> {
    pub date: &'a str,
    pub version: &'a str,
    /// Active streak count, once state has been loaded.
    pub tracked: Option<usize>,
}

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("tg", |value: String| escape_html(&value));
    env.add_template("leaderboard", LEADERBOARD_TEMPLATE)?;
    env.add_template("reset", RESET_TEMPLATE)?;
    env.add_template("motivation", MOTIVATION_TEMPLATE)?;
    env.add_template("banner", BANNER_TEMPLATE)?;
    env.add_template("mentions", MENTIONS_TEMPLATE)?;
    Ok(env)
}

fn render<S: Serialize>(name: &str, ctx: S) -> anyhow::Result<String> {
    let env = environment()?;
    let rendered = env.get_template(name)?.render(ctx)?;
    Ok(rendered.trim_end().to_string())
}

/// Render the ranked leaderboard.
pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> anyhow::Result<String> {
    render("leaderboard", context! { entries => entries })
}

/// Render the notice posted when nobody qualified.
pub fn render_reset() -> anyhow::Result<String> {
    render("reset", context! {})
}

/// Render the closing motivation message.
pub fn render_motivation(quote: &str) -> anyhow::Result<String> {
    render("motivation", context! { quote => quote })
}

pub fn render_banner(ctx: &BannerContext<'_>) -> anyhow::Result<String> {
    render("banner", ctx)
}

/// Render one batch of member mentions.
pub fn render_mentions(members: &[Participant]) -> anyhow::Result<String> {
    render("mentions", context! { members => members })
}
