use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::config::{Config, Credentials};
use crate::cycle::{Cycle, LeaderboardOutcome};
use crate::messenger::Telegram;
use crate::messenger::bot_api::BotApi;
use crate::messenger::gateway::UserGateway;
use crate::pacing::ThreadPacer;
use crate::quote::{GroqClient, TextGenerator};
use crate::store::FileStore;

/// Per-request timeout for chat calls.
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to streakbot.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn bot_api(credentials: &Credentials) -> BotApi {
    BotApi::new(&credentials.bot_token, credentials.group_id, REMOTE_TIMEOUT)
}

pub fn telegram(credentials: &Credentials) -> Telegram {
    let gateway = UserGateway::new(
        &credentials.gateway_url,
        &credentials.gateway_token,
        credentials.group_id,
        REMOTE_TIMEOUT,
    );
    Telegram::new(bot_api(credentials), gateway)
}

impl RunArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let credentials = Credentials::from_env()?;
        let config = Config::resolve(self.config.as_deref())?;

        let telegram = telegram(&credentials);
        let motivation = &config.motivation;
        let groq = credentials.groq_api_key.as_deref().map(|key| {
            GroqClient::new(&motivation.endpoint, key, &motivation.model, motivation.timeout())
        });
        if groq.is_none() {
            tracing::warn!("GROQ_API_KEY not set, motivation comes from the backup pool");
        }
        let store = FileStore::new(&config.state.dir);
        let pacer = ThreadPacer;

        tracing::info!(
            group = credentials.group_id,
            state_dir = %store.dir().display(),
            version = env!("CARGO_PKG_VERSION"),
            "starting daily cycle"
        );

        let cycle = Cycle::new(
            &telegram,
            groq.as_ref().map(|g| g as &dyn TextGenerator),
            &store,
            &pacer,
            &config,
        );
        let report = cycle.run(&mut rand::rng())?;

        let leaderboard = match report.leaderboard {
            LeaderboardOutcome::NoPriorPoll => "skipped (no previous poll)".to_string(),
            LeaderboardOutcome::TallyFailed => "skipped (votes unreadable)".to_string(),
            LeaderboardOutcome::Updated {
                tracked,
                saved,
                delivered,
            } => format!("{tracked} tracked, saved={saved}, delivered={delivered}"),
        };
        tracing::info!(
            poll = %report.poll.0,
            leaderboard = %leaderboard,
            tagged = report.tags.tagged,
            eligible = report.tags.eligible,
            failed_batches = report.tags.failed_batches,
            announced = report.announced,
            "cycle complete"
        );
        Ok(())
    }
}
