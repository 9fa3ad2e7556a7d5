// ============================
// chatroom-backend-lib/src/message_log.rs
// ============================
//! Append-only chat history with per-participant visibility.
use chatroom_common::{ChatMessage, MessageKind, BROADCAST_TARGET};
use chrono::{DateTime, Local, Utc};
use metrics::counter;

use crate::error::AppError;
use crate::metrics::{MESSAGE_POSTED, MESSAGE_REJECTED};
use crate::storage::{MessageDraft, Storage, StoredMessage};
use crate::validation::ValidMessage;

/// Handle over the `messages` collection
#[derive(Clone)]
pub struct MessageLog<S> {
    storage: S,
}

/// True when `participant` may see `message`: every broadcast, plus private
/// exchanges addressed to or sent by them. Without an identity only
/// broadcasts are visible.
pub fn is_visible_to(message: &StoredMessage, participant: Option<&str>) -> bool {
    if message.to == BROADCAST_TARGET {
        return true;
    }
    participant.is_some_and(|name| message.to == name || message.from == name)
}

/// Render a stored entry the way clients expect it
pub fn render(message: &StoredMessage) -> ChatMessage {
    ChatMessage {
        from: message.from.clone(),
        to: message.to.clone(),
        text: message.text.clone(),
        kind: message.kind,
        time: message
            .sent_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string(),
    }
}

impl<S: Storage + Clone> MessageLog<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Append without domain checks. Only persistence can fail.
    pub async fn append(
        &self,
        from: &str,
        to: &str,
        text: &str,
        kind: MessageKind,
        now: DateTime<Utc>,
    ) -> Result<StoredMessage, AppError> {
        self.storage
            .append_message(MessageDraft {
                from: from.to_string(),
                to: to.to_string(),
                text: text.to_string(),
                kind,
                sent_at: now,
            })
            .await
    }

    /// Append a message posted by a user. The sender must be registered and
    /// the kind must be one users may post.
    pub async fn append_user_message(
        &self,
        message: ValidMessage,
        now: DateTime<Utc>,
    ) -> Result<StoredMessage, AppError> {
        if message.kind == MessageKind::Status {
            counter!(MESSAGE_REJECTED).increment(1);
            return Err(AppError::invalid(
                "\"type\" must be one of [message, private_message]",
            ));
        }

        if self.storage.find_participant(&message.from).await?.is_none() {
            counter!(MESSAGE_REJECTED).increment(1);
            tracing::warn!("Rejected message from unregistered sender {}", message.from);
            return Err(AppError::UnknownSender(message.from));
        }

        let stored = self
            .append(&message.from, &message.to, &message.text, message.kind, now)
            .await?;

        counter!(MESSAGE_POSTED, "type" => message.kind.as_str()).increment(1);
        tracing::debug!("{} -> {} ({})", stored.from, stored.to, stored.kind.as_str());
        Ok(stored)
    }

    /// Messages `participant` may see, oldest first. With a `limit` only the
    /// newest `limit` of them are returned, still oldest first.
    pub async fn retrieve(
        &self,
        participant: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<StoredMessage>, AppError> {
        if let Some(limit) = limit {
            if limit <= 0 {
                return Err(AppError::invalid("\"limit\" must be a positive number"));
            }
        }

        let mut visible: Vec<StoredMessage> = self
            .storage
            .read_messages()
            .await?
            .into_iter()
            .filter(|m| is_visible_to(m, participant))
            .collect();

        if let Some(limit) = limit {
            let keep = usize::try_from(limit).unwrap_or(usize::MAX);
            let skip = visible.len().saturating_sub(keep);
            visible.drain(..skip);
        }

        Ok(visible)
    }
}
