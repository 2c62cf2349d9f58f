use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::doctor::OutputFormat;
use crate::config::Config;
use crate::rank::rank;
use crate::store::{FileStore, StateStore};

/// Entries listed in the status view.
const TOP_ENTRIES: usize = 5;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Path to streakbot.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state_dir: String,
    /// Message id of the poll awaiting tally.
    pub poll: Option<i64>,
    pub tracked: usize,
    pub top: Vec<StreakSummary>,
    pub quotes: QuoteSummary,
}

#[derive(Debug, Serialize)]
pub struct StreakSummary {
    pub user: String,
    pub streak: u32,
    pub title: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    pub remembered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

impl StatusArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });

        let config = Config::resolve(self.config.as_deref())?;
        let store = super::existing_store(&config)?;
        let report = build_report(&store);

        match format {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }
}

pub fn build_report(store: &FileStore) -> StatusReport {
    let streaks = store.streaks();
    let history = store.quote_history();

    StatusReport {
        state_dir: store.dir().display().to_string(),
        poll: store.poll_ref().map(|p| p.0.0),
        tracked: streaks.len(),
        top: streaks
            .ranked()
            .into_iter()
            .take(TOP_ENTRIES)
            .map(|(user, streak)| StreakSummary {
                user: user.to_string(),
                streak,
                title: rank(streak).title,
            })
            .collect(),
        quotes: QuoteSummary {
            remembered: history.len(),
            latest: history.latest().map(str::to_string),
        },
    }
}

fn print_pretty(report: &StatusReport) {
    println!("=== Streakbot Status ===\n");
    println!("State: {}", report.state_dir);
    match report.poll {
        Some(id) => println!("Active poll: message {id}"),
        None => println!("No active poll"),
    }

    println!("\nStreaks: {} tracked", report.tracked);
    for entry in &report.top {
        println!("  • {}  {} days  {}", entry.user, entry.streak, entry.title);
    }
    if report.tracked > report.top.len() {
        println!("  ... and {} more", report.tracked - report.top.len());
    }

    println!("\nQuotes remembered: {}", report.quotes.remembered);
    if let Some(latest) = &report.quotes.latest {
        println!("Latest: {latest}");
    }
}

fn print_text(report: &StatusReport) {
    println!("streakbot-status  state={}", report.state_dir);
    match report.poll {
        Some(id) => println!("poll  id={id}"),
        None => println!("poll  none"),
    }
    println!("streaks  tracked={}", report.tracked);
    for entry in &report.top {
        println!("streak  user={}  days={}", entry.user, entry.streak);
    }
    println!("quotes  remembered={}", report.quotes.remembered);
}
