// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between chat clients and the chatroom server.
//! This module defines the JSON bodies exchanged over HTTP and the
//! sentinel values both sides agree on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipient value meaning "everyone in the room"
pub const BROADCAST_TARGET: &str = "Todos";

/// Text of the status message recorded when a participant joins
pub const JOIN_TEXT: &str = "entra na sala...";

/// Text of the status message recorded when a participant is evicted
pub const LEAVE_TEXT: &str = "sai da sala...";

/// A registered participant
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Unique display name
    pub name: String,
    /// Last time the participant was seen alive (epoch milliseconds on the wire)
    #[serde(rename = "lastStatus", with = "chrono::serde::ts_milliseconds")]
    pub last_status: DateTime<Utc>,
}

impl Participant {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            last_status: now,
        }
    }

    /// True when the last heartbeat is strictly older than `cutoff`
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_status < cutoff
    }
}

/// Kind of a chat entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Public message addressed to a name or to everyone
    Message,
    /// Message only the sender and the recipient can see
    PrivateMessage,
    /// Synthetic join/leave announcement
    Status,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// Parse a kind a user is allowed to post. `status` is reserved for the server.
    pub fn parse_user_kind(raw: &str) -> Option<Self> {
        match raw {
            "message" => Some(MessageKind::Message),
            "private_message" => Some(MessageKind::PrivateMessage),
            _ => None,
        }
    }
}

/// A chat entry as rendered to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Wall-clock time of the write, formatted `HH:MM:SS`
    pub time: String,
}

/// Body of `POST /participants`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewParticipant {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /messages`. The sender travels in the `User` header.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewMessage {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Query string of `GET /messages`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MessagesQuery {
    /// Kept raw so a non-numeric value can be reported as a validation failure
    #[serde(default)]
    pub limit: Option<String>,
}
