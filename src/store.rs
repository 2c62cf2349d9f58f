//! Durable state between daily cycles.
//!
//! Three small files live in the state directory:
//!
//! - `streak_data.json` holds the streak map as a JSON object of user id to
//!   day count.
//! - `last_poll_id.txt` holds the message id of the open poll, as text.
//! - `quotes_db.txt` holds the recent motivational lines, one per line.
//!
//! Every write goes to a temp file in the same directory which is then
//! renamed over the target, so a crash never leaves a half-written file.
//! Every read falls back to a default when the file is missing or unreadable.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::messenger::{MessageId, PollRef};
use crate::quote::QuoteHistory;
use crate::streak::StreakMap;

pub const STREAK_FILE: &str = "streak_data.json";
pub const POLL_FILE: &str = "last_poll_id.txt";
pub const QUOTES_FILE: &str = "quotes_db.txt";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted cycle state.
pub trait StateStore {
    fn streaks(&self) -> StreakMap;
    fn save_streaks(&self, streaks: &StreakMap) -> Result<(), StoreError>;

    fn poll_ref(&self) -> Option<PollRef>;
    fn save_poll_ref(&self, poll: PollRef) -> Result<(), StoreError>;

    fn quote_history(&self) -> QuoteHistory;
    fn save_quote_history(&self, history: &QuoteHistory) -> Result<(), StoreError>;
}

/// File-backed [`StateStore`] rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Read a file as text. Missing or unreadable files give None.
    pub fn load_text(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::error!(path = %path.display(), "failed to read state file: {e}");
                None
            }
        }
    }

    /// Decode a JSON file, or return `default` when it is missing or malformed.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        let Some(contents) = self.load_text(name) else {
            return default;
        };
        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(file = name, "malformed state file, using default: {e}");
                default
            }
        }
    }

    /// Atomically replace `name` with `bytes`.
    pub fn save_bytes(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path(name);
        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Encode {
            path: self.path(name),
            source,
        })?;
        self.save_bytes(name, &bytes)
    }

    /// Create the directory if needed and prove a file can be written there.
    pub fn check_writable(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.dir.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn streaks(&self) -> StreakMap {
        self.load_json(STREAK_FILE, StreakMap::default()).without_zeroes()
    }

    fn save_streaks(&self, streaks: &StreakMap) -> Result<(), StoreError> {
        self.save_json(STREAK_FILE, streaks)
    }

    fn poll_ref(&self) -> Option<PollRef> {
        let raw = self.load_text(POLL_FILE)?;
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Some(PollRef(MessageId(id))),
            _ => {
                tracing::error!(file = POLL_FILE, contents = raw.trim(), "ignoring unreadable poll reference");
                None
            }
        }
    }

    fn save_poll_ref(&self, poll: PollRef) -> Result<(), StoreError> {
        self.save_bytes(POLL_FILE, poll.0.to_string().as_bytes())
    }

    fn quote_history(&self) -> QuoteHistory {
        self.load_text(QUOTES_FILE)
            .map(|contents| QuoteHistory::from_lines(&contents))
            .unwrap_or_default()
    }

    fn save_quote_history(&self, history: &QuoteHistory) -> Result<(), StoreError> {
        self.save_bytes(QUOTES_FILE, history.to_lines().as_bytes())
    }
}
