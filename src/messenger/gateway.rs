//! Client for the user-session gateway.
//!
//! Bots cannot see who voted for what, list every member, or look up
//! arbitrary profiles, so those reads go through a small HTTP bridge that
//! holds a user session for the group. Endpoints (bearer auth):
//!
//! - `GET /chats/{chat}/polls/{message}/votes?option=&offset=&limit=`
//! - `GET /chats/{chat}/participants`
//! - `GET /users/{id}`
//! - `GET /chats/{chat}/messages?limit=`

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{MessageId, Participant, PollRef, UserId, VotePage, transport_error};
use crate::error::RemoteError;

/// How many recent messages to scan for the pin notice.
const PIN_SCAN_LIMIT: u32 = 3;

pub struct UserGateway {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    chat_id: i64,
}

#[derive(Debug, Deserialize)]
struct VotesResponse {
    #[serde(default)]
    users: Vec<VoterEntry>,
    #[serde(default)]
    next_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoterEntry {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ParticipantsResponse {
    #[serde(default)]
    participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<RecentMessage>,
}

#[derive(Debug, Deserialize)]
struct RecentMessage {
    id: i64,
    #[serde(default)]
    action: Option<String>,
}

impl From<VotesResponse> for VotePage {
    fn from(response: VotesResponse) -> Self {
        Self {
            users: response.users.into_iter().map(|u| UserId::from(u.id)).collect(),
            next_offset: response.next_offset.filter(|o| !o.is_empty()),
        }
    }
}

/// Classify a non-success HTTP status from the gateway.
fn status_error(status: u16, retry_after: Option<u64>, body: String) -> RemoteError {
    match status {
        429 => RemoteError::RateLimited {
            retry_after: Duration::from_secs(retry_after.unwrap_or(1)),
        },
        s if s >= 500 => RemoteError::Transient(format!("gateway HTTP {s}")),
        code => RemoteError::Rejected {
            code,
            description: body,
        },
    }
}

impl UserGateway {
    pub fn new(base_url: &str, token: &str, chat_id: i64, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, RemoteError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.token));
        for (key, value) in query {
            request = request.query(*key, value);
        }

        let mut response = request.call().map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(status_error(status, retry_after, body));
        }
        response
            .body_mut()
            .read_json()
            .map_err(|e| transport_error(&e))
    }

    pub fn vote_page(
        &self,
        poll: PollRef,
        option: u8,
        offset: Option<&str>,
        limit: u32,
    ) -> Result<VotePage, RemoteError> {
        let mut query = vec![("option", option.to_string()), ("limit", limit.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let response: VotesResponse = self.get(
            &format!("/chats/{}/polls/{}/votes", self.chat_id, poll.0),
            &query,
        )?;
        Ok(response.into())
    }

    pub fn participants(&self) -> Result<Vec<Participant>, RemoteError> {
        let response: ParticipantsResponse =
            self.get(&format!("/chats/{}/participants", self.chat_id), &[])?;
        Ok(response.participants)
    }

    pub fn display_name(&self, user: &UserId) -> Result<String, RemoteError> {
        let response: ProfileResponse = self.get(&format!("/users/{user}"), &[])?;
        Ok(response
            .first_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    pub fn pin_notice(&self) -> Result<Option<MessageId>, RemoteError> {
        let response: MessagesResponse = self.get(
            &format!("/chats/{}/messages", self.chat_id),
            &[("limit", PIN_SCAN_LIMIT.to_string())],
        )?;
        Ok(find_pin_notice(&response.messages))
    }
}

fn find_pin_notice(messages: &[RecentMessage]) -> Option<MessageId> {
    messages
        .iter()
        .find(|m| m.action.as_deref() == Some("pin_message"))
        .map(|m| MessageId(m.id))
}
