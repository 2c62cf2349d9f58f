use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::polls::OPTION_COUNT;
use crate::retry::RetryPolicy;

/// Config file name looked up in the working directory.
pub const CONFIG_TOML: &str = "streakbot.toml";

/// Find the config file: explicit path, then `./streakbot.toml`, then
/// `<config dir>/streakbot/config.toml`. Returns None if nothing exists.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_TOML);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("streakbot").join("config.toml");
    user.exists().then_some(user)
}

/// Tunables read from `streakbot.toml`. Every field has a default, so an
/// absent file is equivalent to an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub state: StateConfig,
    pub chat: ChatConfig,
    pub poll: PollConfig,
    pub tagging: TaggingConfig,
    pub motivation: MotivationConfig,
    pub pacing: PacingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the streak map, poll reference and quote history.
    pub dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChatConfig {
    /// Handle (without `@`) that is never tagged.
    pub excluded_handle: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            excluded_handle: Some("lotus_dark".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PollConfig {
    /// Zero-based answer indices that keep a streak alive.
    pub qualifying_options: Vec<u8>,
    pub vote_page_size: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            qualifying_options: vec![5, 6],
            vote_page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TaggingConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    /// Added on top of the service's retry-after hint.
    pub rate_limit_grace_secs: u64,
    pub max_attempts: u32,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 2500,
            rate_limit_grace_secs: 2,
            max_attempts: 3,
        }
    }
}

impl TaggingConfig {
    pub const fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub const fn rate_limit_grace(&self) -> Duration {
        Duration::from_secs(self.rate_limit_grace_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.batch_delay())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MotivationConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for MotivationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 1.1,
            timeout_secs: 5,
            max_attempts: 3,
            backoff_ms: 0,
        }
    }
}

impl MotivationConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

/// Deliberate waits between cycle steps, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PacingConfig {
    pub banner: u64,
    pub after_stop: u64,
    pub after_leaderboard: u64,
    pub after_pin: u64,
    pub after_poll: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            banner: 5,
            after_stop: 2,
            after_leaderboard: 3,
            after_pin: 1,
            after_poll: 5,
        }
    }
}

impl PacingConfig {
    /// All pauses disabled.
    pub const fn none() -> Self {
        Self {
            banner: 0,
            after_stop: 0,
            after_leaderboard: 0,
            after_pin: 0,
            after_poll: 0,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse_toml(&contents)
    }

    /// Load the config found by [`find_config`], or defaults when none exists.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match find_config(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExitError::Config(format!("invalid streakbot.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.poll.qualifying_options.is_empty() {
            return Err(ExitError::Config("poll.qualifying_options must not be empty".into()).into());
        }
        if let Some(&option) = self
            .poll
            .qualifying_options
            .iter()
            .find(|&&o| usize::from(o) >= OPTION_COUNT)
        {
            return Err(ExitError::Config(format!(
                "poll.qualifying_options entry {option} is out of range (polls have {OPTION_COUNT} options)"
            ))
            .into());
        }
        if self.tagging.batch_size == 0 {
            return Err(ExitError::Config("tagging.batch_size must be at least 1".into()).into());
        }
        if self.poll.vote_page_size == 0 {
            return Err(ExitError::Config("poll.vote_page_size must be at least 1".into()).into());
        }
        Ok(())
    }
}

/// Secrets and the target group, taken from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub group_id: i64,
    pub gateway_url: String,
    pub gateway_token: String,
    pub groq_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("group_id", &self.group_id)
            .field("gateway_url", &self.gateway_url)
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<set>"))
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ExitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable source. Blank values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| ExitError::Config(format!("missing environment variable {key}")))
        };

        let bot_token = require("BOT_TOKEN")?;
        let group_raw = require("GROUP_ID")?;
        let group_id = group_raw.trim().parse::<i64>().map_err(|_| {
            ExitError::Config(format!("GROUP_ID must be an integer, got {group_raw:?}"))
        })?;
        let gateway_url = require("USER_GATEWAY_URL")?;
        let gateway_token = require("USER_GATEWAY_TOKEN")?;

        Ok(Self {
            bot_token,
            group_id,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            gateway_token,
            groq_api_key: get("GROQ_API_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("BOT_TOKEN", "123:abc"),
            ("GROUP_ID", "-1001234"),
            ("USER_GATEWAY_URL", "https://gateway.local/"),
            ("USER_GATEWAY_TOKEN", "secret"),
        ])
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.poll.qualifying_options, vec![5, 6]);
        assert_eq!(config.poll.vote_page_size, 50);
        assert_eq!(config.tagging.batch_size, 5);
        assert_eq!(config.tagging.batch_delay(), Duration::from_millis(2500));
        assert_eq!(config.motivation.max_attempts, 3);
        assert_eq!(config.chat.excluded_handle.as_deref(), Some("lotus_dark"));
        assert_eq!(config.state.dir, PathBuf::from("."));
    }

    #[test]
    fn parse_partial_toml() {
        let config = Config::parse_toml(
            r#"
[state]
dir = "/var/lib/streakbot"

[poll]
qualifying_options = [6]

[pacing]
banner = 0
"#,
        )
        .unwrap();
        assert_eq!(config.state.dir, PathBuf::from("/var/lib/streakbot"));
        assert_eq!(config.poll.qualifying_options, vec![6]);
        assert_eq!(config.poll.vote_page_size, 50);
        assert_eq!(config.pacing.banner, 0);
        assert_eq!(config.pacing.after_poll, 5);
    }

    #[test]
    fn rejects_empty_qualifying_options() {
        let err = Config::parse_toml("[poll]\nqualifying_options = []\n").unwrap_err();
        assert!(err.to_string().contains("qualifying_options"));
    }

    #[test]
    fn rejects_qualifying_option_past_last_answer() {
        let err = Config::parse_toml("[poll]\nqualifying_options = [6, 7]\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("entry 7 is out of range"), "{msg}");
        assert!(matches!(err.downcast_ref::<ExitError>(), Some(ExitError::Config(_))));
        assert!(Config::parse_toml("[poll]\nqualifying_options = [0, 6]\n").is_ok());
    }

    #[test]
    fn rejects_unknown_types() {
        let err = Config::parse_toml("[tagging]\nbatch_size = \"five\"\n").unwrap_err();
        assert!(err.to_string().contains("invalid streakbot.toml"));
    }

    #[test]
    fn credentials_from_full_env() {
        let vars = full_env();
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.group_id, -1_001_234);
        assert_eq!(creds.gateway_url, "https://gateway.local");
        assert!(creds.groq_api_key.is_none());
    }

    #[test]
    fn credentials_missing_token_is_fatal() {
        let mut vars = full_env();
        vars.remove("BOT_TOKEN");
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ExitError::Config(_)));
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn credentials_blank_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("USER_GATEWAY_TOKEN".into(), "   ".into());
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("USER_GATEWAY_TOKEN"));
    }

    #[test]
    fn credentials_non_numeric_group() {
        let mut vars = full_env();
        vars.insert("GROUP_ID".into(), "my-group".into());
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("GROUP_ID must be an integer"));
    }

    #[test]
    fn debug_hides_secrets() {
        let mut vars = full_env();
        vars.insert("GROQ_API_KEY".into(), "gsk_live".into());
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("123:abc"));
        assert!(!shown.contains("gsk_live"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn find_config_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config(Some(&path)), Some(path));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streakbot.toml");
        std::fs::write(&path, "[tagging]\nbatch_size = 3\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.tagging.batch_size, 3);
    }
}
