// ============================
// chatroom-backend-lib/src/storage.rs
// ============================
//! Storage abstraction over the `participants` and `messages` collections,
//! with an in-memory and a flat-file implementation.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chatroom_common::{MessageKind, Participant};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};

use crate::error::AppError;

const PARTICIPANTS_FILE: &str = "participants.json";
const MESSAGES_FILE: &str = "messages.log";

/// A chat entry waiting to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub sent_at: DateTime<Utc>,
}

/// A chat entry as kept in the `messages` collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Append position, starting at 1
    pub seq: u64,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sent_at: DateTime<Utc>,
}

impl StoredMessage {
    fn from_draft(seq: u64, draft: MessageDraft) -> Self {
        Self {
            seq,
            from: draft.from,
            to: draft.to,
            text: draft.text,
            kind: draft.kind,
            sent_at: draft.sent_at,
        }
    }
}

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a participant unless the name is taken.
    /// Fails with [`AppError::Conflict`] without touching the existing entry.
    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError>;

    /// Look a participant up by name
    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, AppError>;

    /// All current participants, ordered by name
    async fn list_participants(&self) -> Result<Vec<Participant>, AppError>;

    /// Refresh `last_status`. Returns `false` when nobody has that name.
    async fn touch_participant(&self, name: &str, now: DateTime<Utc>) -> Result<bool, AppError>;

    /// Delete `name` unconditionally. Returns `false` when nobody has that name.
    async fn remove_participant(&self, name: &str) -> Result<bool, AppError>;

    /// Participants whose `last_status` is strictly before `cutoff`
    async fn stale_participants(&self, cutoff: DateTime<Utc>) -> Result<Vec<Participant>, AppError>;

    /// Delete `name` only if it is still stale relative to `cutoff`.
    /// Check and delete happen as one step.
    async fn remove_participant_if_stale(
        &self,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Append to the message history
    async fn append_message(&self, draft: MessageDraft) -> Result<StoredMessage, AppError>;

    /// Whole message history in append order
    async fn read_messages(&self) -> Result<Vec<StoredMessage>, AppError>;
}

/// Where the store lives, parsed from the configured connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// `memory://` or `file://<dir>`; a string without a scheme is a directory.
    pub fn parse(url: &str) -> Result<Self, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::Config("database_url must not be empty".to_string()));
        }

        match url.split_once("://") {
            Some(("memory", _)) => Ok(StoreLocation::Memory),
            Some(("file", path)) if !path.is_empty() => Ok(StoreLocation::File(PathBuf::from(path))),
            Some(("file", _)) => Err(AppError::Config(
                "file:// database_url needs a directory".to_string(),
            )),
            Some((scheme, _)) => Err(AppError::Config(format!(
                "unsupported database_url scheme: {scheme}"
            ))),
            None => Ok(StoreLocation::File(PathBuf::from(url))),
        }
    }
}

/// In-memory implementation of the Storage trait
#[derive(Clone, Default)]
pub struct MemoryStorage {
    participants: Arc<DashMap<String, Participant>>,
    messages: Arc<RwLock<Vec<StoredMessage>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        match self.participants.entry(participant.name.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(participant.name.clone())),
            Entry::Vacant(slot) => {
                slot.insert(participant.clone());
                Ok(())
            },
        }
    }

    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, AppError> {
        Ok(self.participants.get(name).map(|entry| entry.value().clone()))
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, AppError> {
        let mut all: Vec<Participant> = self
            .participants
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn touch_participant(&self, name: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        match self.participants.get_mut(name) {
            Some(mut entry) => {
                entry.last_status = now;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn remove_participant(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.participants.remove(name).is_some())
    }

    async fn stale_participants(&self, cutoff: DateTime<Utc>) -> Result<Vec<Participant>, AppError> {
        let mut stale: Vec<Participant> = self
            .participants
            .iter()
            .filter(|entry| entry.is_stale(cutoff))
            .map(|entry| entry.value().clone())
            .collect();
        stale.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stale)
    }

    async fn remove_participant_if_stale(
        &self,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self
            .participants
            .remove_if(name, |_, participant| participant.is_stale(cutoff))
            .is_some())
    }

    async fn append_message(&self, draft: MessageDraft) -> Result<StoredMessage, AppError> {
        let mut messages = self.messages.write();
        let stored = StoredMessage::from_draft(messages.len() as u64 + 1, draft);
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn read_messages(&self) -> Result<Vec<StoredMessage>, AppError> {
        Ok(self.messages.read().clone())
    }
}

/// Flat-file implementation of the Storage trait.
///
/// `participants.json` holds a snapshot that is rewritten on every change,
/// `messages.log` holds one JSON record per line.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    participants: Arc<Mutex<BTreeMap<String, Participant>>>,
    /// Last sequence number handed out; the lock serialises appends
    last_seq: Arc<Mutex<u64>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let participants_path = root.join(PARTICIPANTS_FILE);
        let participants: BTreeMap<String, Participant> = if participants_path.exists() {
            let content = fs::read_to_string(&participants_path)?;
            let list: Vec<Participant> = serde_json::from_str(&content)?;
            list.into_iter().map(|p| (p.name.clone(), p)).collect()
        } else {
            BTreeMap::new()
        };

        let messages_path = root.join(MESSAGES_FILE);
        let last_seq = if messages_path.exists() {
            let content = fs::read_to_string(&messages_path)?;
            if !content.is_empty() && !content.ends_with('\n') {
                // drop an unfinished trailing record before appending after it
                let keep = content.rfind('\n').map_or(0, |idx| idx + 1);
                tracing::warn!(
                    "Dropping {} byte(s) of an unfinished record from {}",
                    content.len() - keep,
                    messages_path.display()
                );
                fs::OpenOptions::new()
                    .write(true)
                    .open(&messages_path)?
                    .set_len(keep as u64)?;
            }
            parse_message_log(&content)?.last().map_or(0, |m| m.seq)
        } else {
            0
        };

        tracing::debug!(
            "Opened flat-file store at {} ({} participants, {} messages)",
            root.display(),
            participants.len(),
            last_seq
        );

        Ok(Self {
            root,
            participants: Arc::new(Mutex::new(participants)),
            last_seq: Arc::new(Mutex::new(last_seq)),
        })
    }

    /// Rewrite the participants snapshot through a temp file so readers never see half of it
    async fn persist_participants(
        &self,
        participants: &BTreeMap<String, Participant>,
    ) -> Result<(), AppError> {
        let path = self.root.join(PARTICIPANTS_FILE);
        let tmp = self.root.join(format!("{PARTICIPANTS_FILE}.tmp"));

        let list: Vec<&Participant> = participants.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Parse `messages.log`. A last line without its newline is an append still
/// in flight and is skipped.
fn parse_message_log(content: &str) -> Result<Vec<StoredMessage>, AppError> {
    let complete = match content.rfind('\n') {
        Some(idx) => &content[..idx],
        None => "",
    };

    complete
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        let mut participants = self.participants.lock().await;
        if participants.contains_key(&participant.name) {
            return Err(AppError::Conflict(participant.name.clone()));
        }

        participants.insert(participant.name.clone(), participant.clone());
        if let Err(e) = self.persist_participants(&participants).await {
            participants.remove(&participant.name);
            return Err(e);
        }
        Ok(())
    }

    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, AppError> {
        Ok(self.participants.lock().await.get(name).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, AppError> {
        Ok(self.participants.lock().await.values().cloned().collect())
    }

    async fn touch_participant(&self, name: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut participants = self.participants.lock().await;
        let Some(entry) = participants.get_mut(name) else {
            return Ok(false);
        };

        let previous = entry.last_status;
        entry.last_status = now;
        if let Err(e) = self.persist_participants(&participants).await {
            if let Some(entry) = participants.get_mut(name) {
                entry.last_status = previous;
            }
            return Err(e);
        }
        Ok(true)
    }

    async fn remove_participant(&self, name: &str) -> Result<bool, AppError> {
        let mut participants = self.participants.lock().await;
        let Some(removed) = participants.remove(name) else {
            return Ok(false);
        };

        if let Err(e) = self.persist_participants(&participants).await {
            participants.insert(removed.name.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn stale_participants(&self, cutoff: DateTime<Utc>) -> Result<Vec<Participant>, AppError> {
        Ok(self
            .participants
            .lock()
            .await
            .values()
            .filter(|p| p.is_stale(cutoff))
            .cloned()
            .collect())
    }

    async fn remove_participant_if_stale(
        &self,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut participants = self.participants.lock().await;
        let still_stale = participants.get(name).is_some_and(|p| p.is_stale(cutoff));
        if !still_stale {
            return Ok(false);
        }

        let removed = participants.remove(name);
        if let Err(e) = self.persist_participants(&participants).await {
            if let Some(participant) = removed {
                participants.insert(participant.name.clone(), participant);
            }
            return Err(e);
        }
        Ok(true)
    }

    async fn append_message(&self, draft: MessageDraft) -> Result<StoredMessage, AppError> {
        let mut last_seq = self.last_seq.lock().await;
        let stored = StoredMessage::from_draft(*last_seq + 1, draft);

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(MESSAGES_FILE))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *last_seq = stored.seq;
        Ok(stored)
    }

    async fn read_messages(&self) -> Result<Vec<StoredMessage>, AppError> {
        let path = self.root.join(MESSAGES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio_fs::read_to_string(&path).await?;
        parse_message_log(&content)
    }
}
