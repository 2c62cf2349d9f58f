//! The messaging collaborator: everything the cycle asks of the chat service.

pub mod bot_api;
pub mod gateway;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use bot_api::BotApi;
use gateway::UserGateway;

/// Stable external user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message in the target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The most recently issued, not-yet-closed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollRef(pub MessageId);

/// A member of the group as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// One page of voters for a single poll option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotePage {
    pub users: Vec<UserId>,
    /// Continuation token; None or empty means this was the last page.
    pub next_offset: Option<String>,
}

/// Chat operations against the single configured group.
pub trait Messenger {
    fn send_message(&self, html: &str) -> Result<MessageId, RemoteError>;
    fn edit_message(&self, id: MessageId, html: &str) -> Result<(), RemoteError>;
    fn delete_message(&self, id: MessageId) -> Result<(), RemoteError>;
    /// Pin without notifying members.
    fn pin_message(&self, id: MessageId) -> Result<(), RemoteError>;
    /// Post a non-anonymous, single-answer poll.
    fn send_poll(&self, question: &str, options: &[&str]) -> Result<MessageId, RemoteError>;
    fn stop_poll(&self, id: MessageId) -> Result<(), RemoteError>;

    fn list_participants(&self) -> Result<Vec<Participant>, RemoteError>;
    fn vote_page(
        &self,
        poll: PollRef,
        option: u8,
        offset: Option<&str>,
        limit: u32,
    ) -> Result<VotePage, RemoteError>;
    fn resolve_user(&self, user: &UserId) -> Result<String, RemoteError>;
    /// The service notice announcing the most recent pin, if still visible.
    fn pin_notice(&self) -> Result<Option<MessageId>, RemoteError>;
}

/// Bot API for writes, user gateway for reads.
pub struct Telegram {
    bot: BotApi,
    gateway: UserGateway,
}

impl Telegram {
    pub const fn new(bot: BotApi, gateway: UserGateway) -> Self {
        Self { bot, gateway }
    }

    pub const fn bot(&self) -> &BotApi {
        &self.bot
    }
}

impl Messenger for Telegram {
    fn send_message(&self, html: &str) -> Result<MessageId, RemoteError> {
        self.bot.send_message(html)
    }

    fn edit_message(&self, id: MessageId, html: &str) -> Result<(), RemoteError> {
        self.bot.edit_message(id, html)
    }

    fn delete_message(&self, id: MessageId) -> Result<(), RemoteError> {
        self.bot.delete_message(id)
    }

    fn pin_message(&self, id: MessageId) -> Result<(), RemoteError> {
        self.bot.pin_message(id)
    }

    fn send_poll(&self, question: &str, options: &[&str]) -> Result<MessageId, RemoteError> {
        self.bot.send_poll(question, options)
    }

    fn stop_poll(&self, id: MessageId) -> Result<(), RemoteError> {
        self.bot.stop_poll(id)
    }

    fn list_participants(&self) -> Result<Vec<Participant>, RemoteError> {
        self.gateway.participants()
    }

    fn vote_page(
        &self,
        poll: PollRef,
        option: u8,
        offset: Option<&str>,
        limit: u32,
    ) -> Result<VotePage, RemoteError> {
        self.gateway.vote_page(poll, option, offset, limit)
    }

    fn resolve_user(&self, user: &UserId) -> Result<String, RemoteError> {
        self.gateway.display_name(user)
    }

    fn pin_notice(&self) -> Result<Option<MessageId>, RemoteError> {
        self.gateway.pin_notice()
    }
}

/// Escape text for Telegram's HTML parse mode. Double quotes are escaped too,
/// so the result is also safe inside a quoted attribute.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Map a transport-level failure onto the remote error taxonomy.
pub(crate) fn transport_error(err: &ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Json(e) => RemoteError::Malformed(e.to_string()),
        other => RemoteError::Transient(other.to_string()),
    }
}
