use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::store::StateStore;
use crate::streak;

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Path to streakbot.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl LeaderboardArgs {
    /// Print the board for the stored streaks. Offline, so user ids stand in
    /// for display names.
    pub fn execute(&self) -> anyhow::Result<()> {
        let config = Config::resolve(self.config.as_deref())?;
        let store = super::existing_store(&config)?;
        let text = streak::render_board(&store.streaks(), |user| Ok(user.to_string()))?;
        println!("{text}");
        Ok(())
    }
}
