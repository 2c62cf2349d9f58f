use std::process::ExitCode;

use clap::{Parser, Subcommand};

use streakbot::commands::doctor::DoctorArgs;
use streakbot::commands::leaderboard::LeaderboardArgs;
use streakbot::commands::run::RunArgs;
use streakbot::commands::status::StatusArgs;
use streakbot::{commands, error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "streakbot",
    version,
    about = "Daily study-streak poll, leaderboard and motivation for a group chat"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one daily cycle (close poll, leaderboard, new poll, tags, motivation)
    Run(RunArgs),
    /// Show the persisted streaks, poll and quote history
    Status(StatusArgs),
    /// Render the leaderboard from stored streaks without posting it
    Leaderboard(LeaderboardArgs),
    /// Validate config, credentials and the state directory
    Doctor(DoctorArgs),
    /// Print the JSON Schema for streakbot.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Status(_) => "status",
            Self::Leaderboard(_) => "leaderboard",
            Self::Doctor(_) => "doctor",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    let _telemetry = telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Run(args) => args.execute(),
        Commands::Status(args) => args.execute(),
        Commands::Leaderboard(args) => args.execute(),
        Commands::Doctor(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
