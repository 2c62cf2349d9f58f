//! The daily cycle: quote, banner, leaderboard, new poll, mentions and
//! motivation, in that order.
//!
//! Every remote failure is logged and absorbed at the step boundary. The only
//! exception is issuing the new poll: without it there is nothing to tag
//! members for, so the cycle stops there with [`ExitError::CycleAborted`].

use std::time::Duration;

use rand::RngCore;

use crate::config::Config;
use crate::error::{ExitError, RemoteError};
use crate::messenger::{MessageId, Messenger, Participant, PollRef};
use crate::pacing::Pacer;
use crate::polls;
use crate::quote::{QuoteSelector, TextGenerator};
use crate::retry::RetryPolicy;
use crate::store::StateStore;
use crate::streak::{self, StreakMap};
use crate::tally::tally;
use crate::template::{self, BannerContext};

/// What happened to yesterday's poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardOutcome {
    /// No poll reference was stored; streaks were not touched.
    NoPriorPoll,
    /// Votes could not be read; stored streaks were left as they were.
    TallyFailed,
    /// Streaks were advanced.
    Updated {
        tracked: usize,
        saved: bool,
        delivered: bool,
    },
}

/// Mention delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub eligible: usize,
    pub tagged: usize,
    pub failed_batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub quote: String,
    pub leaderboard: LeaderboardOutcome,
    pub poll: PollRef,
    pub tags: TagSummary,
    pub announced: bool,
}

/// One daily run over injected collaborators.
pub struct Cycle<'a> {
    messenger: &'a dyn Messenger,
    generator: Option<&'a dyn TextGenerator>,
    store: &'a dyn StateStore,
    pacer: &'a dyn Pacer,
    config: &'a Config,
    date: String,
}

impl<'a> Cycle<'a> {
    pub fn new(
        messenger: &'a dyn Messenger,
        generator: Option<&'a dyn TextGenerator>,
        store: &'a dyn StateStore,
        pacer: &'a dyn Pacer,
        config: &'a Config,
    ) -> Self {
        Self {
            messenger,
            generator,
            store,
            pacer,
            config,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Override the date shown on the banner.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn run(&self, rng: &mut dyn RngCore) -> Result<CycleReport, ExitError> {
        let quote = self.prepare_quote(rng);
        let prior = self.store.streaks();

        self.banner(prior.len());
        let leaderboard = self.leaderboard(&prior);
        let poll = self.issue_poll(rng)?;
        let tags = self.tag_members();
        let announced = self.announce(&quote);

        Ok(CycleReport {
            quote,
            leaderboard,
            poll,
            tags,
            announced,
        })
    }

    fn pause_secs(&self, secs: u64) {
        self.pacer.pause(Duration::from_secs(secs));
    }

    fn prepare_quote(&self, rng: &mut dyn RngCore) -> String {
        let _step = tracing::info_span!("step", name = "quote").entered();
        let motivation = &self.config.motivation;
        let selector = QuoteSelector::new(
            self.generator,
            motivation.retry_policy(),
            motivation.temperature,
            self.pacer,
        );

        let mut history = self.store.quote_history();
        let quote = selector.select(&mut history, rng);
        if let Err(e) = self.store.save_quote_history(&history) {
            tracing::error!("failed to save quote history: {e}");
        }
        quote
    }

    fn banner(&self, tracked: usize) {
        let _step = tracing::info_span!("step", name = "banner").entered();
        let version = env!("CARGO_PKG_VERSION");
        let render = |tracked| {
            template::render_banner(&BannerContext {
                date: &self.date,
                version,
                tracked,
            })
        };

        let id = match render(None).map(|text| self.messenger.send_message(&text)) {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => {
                tracing::warn!("status banner not sent: {e}");
                return;
            }
            Err(e) => {
                tracing::warn!("status banner not rendered: {e:#}");
                return;
            }
        };

        match render(Some(tracked)) {
            Ok(text) => {
                if let Err(e) = self.messenger.edit_message(id, &text) {
                    tracing::warn!(message = %id, "status banner not updated: {e}");
                }
            }
            Err(e) => tracing::warn!("status banner not rendered: {e:#}"),
        }

        self.pause_secs(self.config.pacing.banner);
        self.delete_quietly(id, "status banner");
    }

    fn delete_quietly(&self, id: MessageId, what: &str) {
        match self.messenger.delete_message(id) {
            Ok(()) => tracing::debug!(message = %id, "deleted {what}"),
            Err(e) if e.is_already_done() => tracing::debug!(message = %id, "{what} already gone"),
            Err(e) => tracing::warn!(message = %id, "could not delete {what}: {e}"),
        }
    }

    fn leaderboard(&self, prior: &StreakMap) -> LeaderboardOutcome {
        let _step = tracing::info_span!("step", name = "leaderboard").entered();
        let outcome = self.close_and_rank(prior);
        self.pause_secs(self.config.pacing.after_leaderboard);
        outcome
    }

    fn close_and_rank(&self, prior: &StreakMap) -> LeaderboardOutcome {
        let Some(poll) = self.store.poll_ref() else {
            tracing::info!("no previous poll, skipping leaderboard");
            return LeaderboardOutcome::NoPriorPoll;
        };

        match self.messenger.stop_poll(poll.0) {
            Ok(()) => tracing::info!(poll = %poll.0, "closed previous poll"),
            Err(e) if e.is_already_done() => {
                tracing::info!(poll = %poll.0, "previous poll was already closed");
            }
            Err(e) => tracing::warn!(poll = %poll.0, "could not close previous poll: {e}"),
        }
        self.pause_secs(self.config.pacing.after_stop);

        let poll_config = &self.config.poll;
        let qualifying = match tally(
            self.messenger,
            poll,
            &poll_config.qualifying_options,
            poll_config.vote_page_size,
        ) {
            Ok(qualifying) => qualifying,
            Err(e) => {
                tracing::error!("{e}; keeping stored streaks");
                return LeaderboardOutcome::TallyFailed;
            }
        };
        tracing::info!(qualifying = qualifying.len(), "tallied votes");

        let next = prior.advance(&qualifying);
        let saved = match self.store.save_streaks(&next) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to save streaks: {e}");
                false
            }
        };

        let delivered = match streak::render_board(&next, |user| self.messenger.resolve_user(user)) {
            Ok(text) => match self.messenger.send_message(&text) {
                Ok(_) => {
                    tracing::info!(tracked = next.len(), "leaderboard delivered");
                    true
                }
                Err(e) => {
                    tracing::error!("leaderboard not sent: {e}");
                    false
                }
            },
            Err(e) => {
                tracing::error!("leaderboard not rendered: {e:#}");
                false
            }
        };

        LeaderboardOutcome::Updated {
            tracked: next.len(),
            saved,
            delivered,
        }
    }

    fn issue_poll(&self, rng: &mut dyn RngCore) -> Result<PollRef, ExitError> {
        let _step = tracing::info_span!("step", name = "poll").entered();
        let poll_template = polls::choose(rng);

        let id = self
            .messenger
            .send_poll(poll_template.question, &poll_template.options)
            .map_err(|e| {
                tracing::error!("failed to send poll: {e}");
                tracing::warn!("previous poll reference kept; the next run will tally it again");
                ExitError::CycleAborted(format!("could not issue the daily poll: {e}"))
            })?;
        let poll = PollRef(id);
        tracing::info!(poll = %id, "poll sent");

        if let Err(e) = self.store.save_poll_ref(poll) {
            tracing::error!(poll = %id, "failed to save poll reference: {e}");
        }

        self.pin(id);
        self.pause_secs(self.config.pacing.after_poll);
        Ok(poll)
    }

    fn pin(&self, id: MessageId) {
        if let Err(e) = self.messenger.pin_message(id) {
            tracing::warn!(message = %id, "could not pin poll: {e}");
            return;
        }
        self.pause_secs(self.config.pacing.after_pin);

        match self.messenger.pin_notice() {
            Ok(Some(notice)) => self.delete_quietly(notice, "pin notice"),
            Ok(None) => tracing::debug!("no pin notice found"),
            Err(e) => tracing::warn!("could not look up pin notice: {e}"),
        }
    }

    fn is_eligible(&self, member: &Participant) -> bool {
        if member.bot || member.deleted {
            return false;
        }
        let excluded = self
            .config
            .chat
            .excluded_handle
            .as_deref()
            .map(|h| h.trim_start_matches('@'));
        match (member.username.as_deref(), excluded) {
            (Some(name), Some(excluded)) => !name.eq_ignore_ascii_case(excluded),
            _ => true,
        }
    }

    fn tag_members(&self) -> TagSummary {
        let _step = tracing::info_span!("step", name = "tagging").entered();
        let members = match self.messenger.list_participants() {
            Ok(members) => members,
            Err(e) => {
                tracing::error!("could not list participants: {e}");
                return TagSummary::default();
            }
        };

        let eligible: Vec<Participant> = members.into_iter().filter(|m| self.is_eligible(m)).collect();
        let mut summary = TagSummary {
            eligible: eligible.len(),
            ..TagSummary::default()
        };
        if eligible.is_empty() {
            return summary;
        }
        tracing::info!(members = eligible.len(), "tagging members");

        let tagging = &self.config.tagging;
        let policy = tagging.retry_policy();
        let batches: Vec<&[Participant]> = eligible.chunks(tagging.batch_size).collect();

        for (i, batch) in batches.iter().enumerate() {
            let delivered = match template::render_mentions(batch) {
                Ok(text) => self.send_batch(&text, policy),
                Err(e) => {
                    tracing::error!(batch = i + 1, "mentions not rendered: {e:#}");
                    false
                }
            };
            if delivered {
                summary.tagged += batch.len();
            } else {
                summary.failed_batches += 1;
            }
            if i + 1 < batches.len() {
                self.pacer.pause(tagging.batch_delay());
            }
        }
        summary
    }

    /// Send one mention batch. A rate limit is honored and the same batch is
    /// retried; any other failure gives up on the batch.
    fn send_batch(&self, text: &str, policy: RetryPolicy) -> bool {
        for attempt in policy.attempts() {
            match self.messenger.send_message(text) {
                Ok(_) => return true,
                Err(RemoteError::RateLimited { retry_after }) if policy.has_next(attempt) => {
                    let wait = retry_after.saturating_add(self.config.tagging.rate_limit_grace());
                    tracing::warn!(attempt, wait_secs = wait.as_secs(), "rate limited while tagging");
                    self.pacer.pause(wait);
                }
                Err(e) => {
                    tracing::error!(attempt, "mention batch failed: {e}");
                    return false;
                }
            }
        }
        false
    }

    fn announce(&self, quote: &str) -> bool {
        let _step = tracing::info_span!("step", name = "announce").entered();
        let text = match template::render_motivation(quote) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("motivation not rendered: {e:#}");
                return false;
            }
        };
        match self.messenger.send_message(&text) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("motivation not sent: {e}");
                false
            }
        }
    }
}
