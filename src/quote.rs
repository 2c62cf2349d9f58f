//! Picking the day's motivational line.
//!
//! A text service is asked first; a candidate is kept only when it survives
//! cleanup and has not been used recently. When the attempt budget runs out
//! the line comes from a fixed backup pool instead.

use std::collections::VecDeque;
use std::sync::OnceLock;
use std::time::Duration;

use rand::RngCore;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde_json::json;

use crate::pacing::Pacer;
use crate::retry::RetryPolicy;

/// Recent lines kept for de-duplication.
pub const HISTORY_CAPACITY: usize = 20;

pub const BACKUP_QUOTES: [&str; 5] = [
    "Discipline is choosing between what you want now and what you want most.",
    "The pain of study is temporary; the pain of regret is forever.",
    "Don't stop when you're tired. Stop when you're done.",
    "Your future self is watching you right now through memories.",
    "Do something today that your future self will thank you for.",
];

pub const PROMPT: &str = "Write exactly ONE savage, short, high-intensity study motivation. \
Max 15 words. No hashtags. No quotes. Output ONLY the text. You can use Hinglish too.";

/// Recently used lines, oldest first, capped at [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteHistory(VecDeque<String>);

impl QuoteHistory {
    /// Parse newline-delimited history, skipping blank lines and keeping the
    /// most recent entries.
    pub fn from_lines(contents: &str) -> Self {
        let mut history = Self::default();
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            history.push(line.to_string());
        }
        history
    }

    pub fn to_lines(&self) -> String {
        self.0.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Append a line, evicting the oldest beyond capacity.
    pub fn push(&mut self, quote: String) {
        self.0.push_back(quote);
        while self.0.len() > HISTORY_CAPACITY {
            self.0.pop_front();
        }
    }

    pub fn contains(&self, quote: &str) -> bool {
        self.0.iter().any(|q| q == quote)
    }

    pub fn latest(&self) -> Option<&str> {
        self.0.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// An external text-completion service.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;
}

/// OpenAI-compatible chat completion endpoint (Groq by default).
pub struct GroqClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

impl TextGenerator for GroqClient {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&payload)
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let completion: Completion = response
            .body_mut()
            .read_json()
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Malformed("no choices in completion".into()))
    }
}

fn preamble_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(?i)^\s*(?:sure[!,.]?\s*)?(?:here(?:'s| is)|here are)\b[^:\n]*:\s*")
            .expect("preamble pattern is valid")
    })
}

/// Strip wrapping artifacts from generated text: double quotes, a leading
/// "Here's a quote:" style preamble, and anything past the first line.
/// Returns None when nothing usable remains.
pub fn clean_candidate(raw: &str) -> Option<String> {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '“' | '”'))
        .collect();
    let stripped = preamble_re().replace(unquoted.trim(), "");
    let line = stripped
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?;
    Some(line.to_string())
}

/// Chooses one line that is not in the recent history.
pub struct QuoteSelector<'a> {
    generator: Option<&'a dyn TextGenerator>,
    policy: RetryPolicy,
    temperature: f32,
    pacer: &'a dyn Pacer,
    backups: &'a [&'a str],
}

impl<'a> QuoteSelector<'a> {
    pub fn new(
        generator: Option<&'a dyn TextGenerator>,
        policy: RetryPolicy,
        temperature: f32,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self {
            generator,
            policy,
            temperature,
            pacer,
            backups: &BACKUP_QUOTES,
        }
    }

    #[must_use]
    pub fn with_backups(mut self, backups: &'a [&'a str]) -> Self {
        self.backups = backups;
        self
    }

    /// Pick a line, record it in `history` and return it.
    pub fn select(&self, history: &mut QuoteHistory, rng: &mut dyn RngCore) -> String {
        let quote = self
            .generated(history)
            .unwrap_or_else(|| self.fallback(history, rng));
        history.push(quote.clone());
        quote
    }

    fn generated(&self, history: &QuoteHistory) -> Option<String> {
        let generator = self.generator?;

        for attempt in self.policy.attempts() {
            tracing::info!(attempt, "generating motivation");
            match generator.generate(PROMPT, self.temperature) {
                Ok(raw) => match clean_candidate(&raw) {
                    Some(quote) if !history.contains(&quote) => return Some(quote),
                    Some(_) => tracing::info!(attempt, "generated line was used recently"),
                    None => tracing::warn!(attempt, "generated line was empty"),
                },
                Err(e) => tracing::warn!(attempt, "generation failed: {e}"),
            }
            if self.policy.has_next(attempt) {
                self.pacer.pause(self.policy.backoff);
            }
        }
        None
    }

    fn fallback(&self, history: &QuoteHistory, rng: &mut dyn RngCore) -> String {
        let fresh: Vec<&str> = self
            .backups
            .iter()
            .copied()
            .filter(|q| !history.contains(q))
            .collect();
        let pool: &[&str] = if fresh.is_empty() { self.backups } else { &fresh };
        tracing::info!(fresh = fresh.len(), "using backup motivation");
        pool.choose(rng)
            .or_else(|| BACKUP_QUOTES.first())
            .map_or_else(String::new, |q| (*q).to_string())
    }
}
