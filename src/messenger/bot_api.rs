//! Telegram Bot API client (blocking, JSON over HTTPS).

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{MessageId, transport_error};
use crate::error::RemoteError;

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Error descriptions that mean the requested state already holds.
const ALREADY_DONE_MARKERS: &[&str] = &[
    "poll has already been closed",
    "message is not modified",
    "message to delete not found",
];

pub struct BotApi {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    chat_id: i64,
}

/// Identity returned by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl<T> Envelope<T> {
    fn into_result(self, http_status: u16) -> Result<T, RemoteError> {
        if self.ok {
            return self
                .result
                .ok_or_else(|| RemoteError::Malformed("ok response without result".into()));
        }

        let code = self.error_code.unwrap_or(http_status);
        let description = self.description.unwrap_or_default();

        if code == 429 {
            let secs = self
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1);
            return Err(RemoteError::RateLimited {
                retry_after: Duration::from_secs(secs),
            });
        }

        let lower = description.to_lowercase();
        if ALREADY_DONE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Err(RemoteError::AlreadyDone(description));
        }
        if code >= 500 {
            return Err(RemoteError::Transient(format!("{code}: {description}")));
        }
        Err(RemoteError::Rejected { code, description })
    }
}

impl BotApi {
    pub fn new(token: &str, chat_id: i64, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.to_string(),
            chat_id,
        }
    }

    /// Point the client at a different Bot API server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T, RemoteError> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let mut response = self
            .agent
            .post(&url)
            .send_json(payload)
            .map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let envelope: Envelope<T> = response
            .body_mut()
            .read_json()
            .map_err(|e| match transport_error(&e) {
                RemoteError::Transient(_) if status >= 500 => {
                    RemoteError::Transient(format!("{method}: HTTP {status}"))
                }
                other => other,
            })?;
        envelope.into_result(status)
    }

    pub fn get_me(&self) -> Result<BotUser, RemoteError> {
        self.call("getMe", &json!({}))
    }

    pub fn send_message(&self, html: &str) -> Result<MessageId, RemoteError> {
        let sent: SentMessage = self.call(
            "sendMessage",
            &json!({
                "chat_id": self.chat_id,
                "text": html,
                "parse_mode": "HTML",
                "link_preview_options": { "is_disabled": true },
            }),
        )?;
        Ok(MessageId(sent.message_id))
    }

    pub fn edit_message(&self, id: MessageId, html: &str) -> Result<(), RemoteError> {
        // Returns the edited Message; its contents are not needed.
        let _: Value = self.call(
            "editMessageText",
            &json!({
                "chat_id": self.chat_id,
                "message_id": id.0,
                "text": html,
                "parse_mode": "HTML",
            }),
        )?;
        Ok(())
    }

    pub fn delete_message(&self, id: MessageId) -> Result<(), RemoteError> {
        let _: bool = self.call(
            "deleteMessage",
            &json!({ "chat_id": self.chat_id, "message_id": id.0 }),
        )?;
        Ok(())
    }

    pub fn pin_message(&self, id: MessageId) -> Result<(), RemoteError> {
        let _: bool = self.call(
            "pinChatMessage",
            &json!({
                "chat_id": self.chat_id,
                "message_id": id.0,
                "disable_notification": true,
            }),
        )?;
        Ok(())
    }

    pub fn send_poll(&self, question: &str, options: &[&str]) -> Result<MessageId, RemoteError> {
        let options: Vec<Value> = options.iter().map(|text| json!({ "text": text })).collect();
        let sent: SentMessage = self.call(
            "sendPoll",
            &json!({
                "chat_id": self.chat_id,
                "question": question,
                "options": options,
                "is_anonymous": false,
                "allows_multiple_answers": false,
            }),
        )?;
        Ok(MessageId(sent.message_id))
    }

    pub fn stop_poll(&self, id: MessageId) -> Result<(), RemoteError> {
        let _: Value = self.call(
            "stopPoll",
            &json!({ "chat_id": self.chat_id, "message_id": id.0 }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: u16, body: &str) -> Result<Value, RemoteError> {
        let envelope: Envelope<Value> = serde_json::from_str(body).unwrap();
        envelope.into_result(status)
    }

    #[test]
    fn ok_envelope_yields_result() {
        let result = classify(200, r#"{"ok":true,"result":{"message_id":77}}"#).unwrap();
        assert_eq!(result["message_id"], 77);
    }

    #[test]
    fn ok_without_result_is_malformed() {
        let err = classify(200, r#"{"ok":true}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
    }

    #[test]
    fn flood_wait_carries_retry_after() {
        let err = classify(
            429,
            r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 17","parameters":{"retry_after":17}}"#,
        )
        .unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
    }

    #[test]
    fn closed_poll_is_already_done() {
        let err = classify(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: poll has already been closed"}"#,
        )
        .unwrap_err();
        assert!(err.is_already_done());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify(502, r#"{"ok":false,"error_code":502,"description":"Bad Gateway"}"#)
            .unwrap_err();
        assert!(matches!(err, RemoteError::Transient(_)));
    }

    #[test]
    fn other_failures_are_rejected() {
        let err = classify(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Rejected {
                code: 400,
                description: "Bad Request: chat not found".into()
            }
        );
    }

    #[test]
    fn missing_error_code_falls_back_to_http_status() {
        let err = classify(403, r#"{"ok":false,"description":"Forbidden: bot was kicked"}"#)
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { code: 403, .. }));
    }

    #[test]
    fn sent_message_decodes() {
        let sent: Envelope<SentMessage> =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":5,"chat":{"id":-1}}}"#)
                .unwrap();
        assert_eq!(sent.into_result(200).unwrap().message_id, 5);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let api = BotApi::new("t", -1, Duration::from_secs(1)).with_base_url("http://localhost:8081/");
        assert_eq!(api.base_url, "http://localhost:8081");
    }
}
