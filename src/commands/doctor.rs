use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::config::{Config, Credentials, find_config};
use crate::error::ExitError;
use crate::store::FileStore;

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Path to streakbot.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Skip the Bot API token check
    #[arg(long)]
    pub offline: bool,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    /// Config file in use, if any.
    pub config_file: Option<String>,
    pub checks: Vec<Check>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advice: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl DoctorReport {
    fn record(&mut self, name: &'static str, result: Result<String, String>) {
        let (ok, detail) = match result {
            Ok(detail) => (true, detail),
            Err(detail) => {
                self.issues.push(format!("{name}: {detail}"));
                (false, detail)
            }
        };
        self.checks.push(Check { name, ok, detail });
    }
}

impl DoctorArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });

        let mut report = DoctorReport {
            config_file: find_config(self.config.as_deref()).map(|p| p.display().to_string()),
            checks: vec![],
            issues: vec![],
            advice: vec![],
        };

        let config = match Config::resolve(self.config.as_deref()) {
            Ok(config) => {
                report.record("config", Ok("loaded".to_string()));
                config
            }
            Err(e) => {
                report.record("config", Err(format!("{e:#}")));
                Config::default()
            }
        };

        let store = FileStore::new(&config.state.dir);
        report.record(
            "state dir",
            store
                .check_writable()
                .map(|()| format!("{} is writable", store.dir().display()))
                .map_err(|e| e.to_string()),
        );

        match Credentials::from_env() {
            Ok(credentials) => {
                report.record("credentials", Ok(format!("group {}", credentials.group_id)));
                if credentials.groq_api_key.is_none() {
                    report
                        .advice
                        .push("set GROQ_API_KEY to generate fresh motivation".to_string());
                }
                if !self.offline {
                    let identity = super::run::bot_api(&credentials)
                        .get_me()
                        .map(|me| match me.username {
                            Some(handle) => format!("@{handle} ({})", me.id),
                            None => format!("{} ({})", me.first_name, me.id),
                        })
                        .map_err(|e| e.to_string());
                    report.record("bot token", identity);
                }
            }
            Err(e) => report.record("credentials", Err(e.to_string())),
        }

        match format {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        let failed = report.checks.iter().filter(|c| !c.ok).count();
        if failed > 0 {
            return Err(ExitError::ChecksFailed { failed }.into());
        }
        Ok(())
    }
}

fn print_pretty(report: &DoctorReport) {
    println!("=== Streakbot Doctor ===\n");
    println!(
        "Config: {}",
        report.config_file.as_deref().unwrap_or("(defaults)")
    );
    println!();

    for check in &report.checks {
        let mark = if check.ok { "✓" } else { "✗" };
        println!("  {mark} {}: {}", check.name, check.detail);
    }

    if report.issues.is_empty() {
        println!("\n✓ No issues found");
    } else {
        println!("\nIssues ({}):", report.issues.len());
        for issue in &report.issues {
            println!("  • {issue}");
        }
    }
    for advice in &report.advice {
        println!("  hint: {advice}");
    }
}

fn print_text(report: &DoctorReport) {
    println!(
        "streakbot-doctor  config={}",
        report.config_file.as_deref().unwrap_or("-")
    );
    for check in &report.checks {
        let status = if check.ok { "ok" } else { "fail" };
        println!("check  {}  {status}  {}", check.name, check.detail);
    }
    if !report.issues.is_empty() {
        println!("issues  count={}", report.issues.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_checks_become_issues() {
        let mut report = DoctorReport {
            config_file: None,
            checks: vec![],
            issues: vec![],
            advice: vec![],
        };
        report.record("config", Ok("loaded".into()));
        report.record("credentials", Err("missing environment variable BOT_TOKEN".into()));

        assert_eq!(report.checks.len(), 2);
        assert!(report.checks[0].ok);
        assert!(!report.checks[1].ok);
        assert_eq!(
            report.issues,
            vec!["credentials: missing environment variable BOT_TOKEN".to_string()]
        );
    }
}
