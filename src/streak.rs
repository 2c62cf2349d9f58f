//! Streak bookkeeping and the ranked leaderboard.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::messenger::UserId;
use crate::rank::rank;
use crate::template;

/// Most entries shown on the leaderboard.
pub const MAX_ENTRIES: usize = 15;
/// Width of the progress bar in cells.
pub const BAR_WIDTH: u32 = 10;
/// Shown when a member's profile cannot be read.
pub const HIDDEN_NAME: &str = "Hidden Warrior";

/// Consecutive qualifying days per user. Users without a streak are absent,
/// never stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreakMap(BTreeMap<UserId, u32>);

impl StreakMap {
    pub fn get(&self, user: &UserId) -> Option<u32> {
        self.0.get(user).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, u32)> {
        self.0.iter().map(|(user, days)| (user, *days))
    }

    /// Drop entries that hold no streak.
    #[must_use]
    pub fn without_zeroes(mut self) -> Self {
        self.0.retain(|_, days| *days > 0);
        self
    }

    /// Next day's map: every qualifying user gets their prior streak plus
    /// one, everyone else is dropped.
    #[must_use]
    pub fn advance(&self, qualifying: &BTreeSet<UserId>) -> Self {
        qualifying
            .iter()
            .map(|user| {
                let prior = self.get(user).unwrap_or(0);
                (user.clone(), prior.saturating_add(1))
            })
            .collect()
    }

    /// Entries by streak, longest first. Equal streaks keep user id order.
    pub fn ranked(&self) -> Vec<(&UserId, u32)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl FromIterator<(UserId, u32)> for StreakMap {
    fn from_iter<I: IntoIterator<Item = (UserId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One rendered leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub user: UserId,
    pub name: String,
    pub streak: u32,
    pub title: &'static str,
    pub next_title: Option<&'static str>,
    pub days_to_next: u32,
    pub marker: String,
    pub bar: String,
}

/// Medal for the podium, `#n` for everyone else.
pub fn marker(position: usize) -> String {
    match position {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("#{n}"),
    }
}

/// Bar scaled against the longest streak, never less than one filled cell.
pub fn progress_bar(streak: u32, max_streak: u32) -> String {
    let filled = if max_streak == 0 {
        1
    } else {
        let scaled = u64::from(streak) * u64::from(BAR_WIDTH) / u64::from(max_streak);
        u32::try_from(scaled).unwrap_or(BAR_WIDTH).clamp(1, BAR_WIDTH)
    };
    let empty = BAR_WIDTH - filled;
    format!("{}{}", "▰".repeat(filled as usize), "▱".repeat(empty as usize))
}

/// Build the top rows, resolving display names as we go. A failed lookup
/// puts [`HIDDEN_NAME`] in that row and moves on.
pub fn leaderboard<F>(streaks: &StreakMap, mut resolve: F) -> Vec<LeaderboardEntry>
where
    F: FnMut(&UserId) -> Result<String, RemoteError>,
{
    let ranked = streaks.ranked();
    let max_streak = ranked.first().map_or(0, |(_, days)| *days);

    ranked
        .into_iter()
        .take(MAX_ENTRIES)
        .enumerate()
        .map(|(i, (user, streak))| {
            let position = i + 1;
            let name = match resolve(user) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(user = %user, "could not resolve member name: {e}");
                    HIDDEN_NAME.to_string()
                }
            };
            let r = rank(streak);
            LeaderboardEntry {
                position,
                user: user.clone(),
                name,
                streak,
                title: r.title,
                next_title: r.next_title,
                days_to_next: r.days_until_next,
                marker: marker(position),
                bar: progress_bar(streak, max_streak),
            }
        })
        .collect()
}

/// The message for the new streak map: the reset notice when nobody
/// qualified, the ranked board otherwise.
pub fn render_board<F>(streaks: &StreakMap, resolve: F) -> anyhow::Result<String>
where
    F: FnMut(&UserId) -> Result<String, RemoteError>,
{
    if streaks.is_empty() {
        return template::render_reset();
    }
    template::render_leaderboard(&leaderboard(streaks, resolve))
}
