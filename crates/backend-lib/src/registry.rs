// ============================
// chatroom-backend-lib/src/registry.rs
// ============================
//! Participant identity, uniqueness and liveness.
use chatroom_common::{MessageKind, Participant, BROADCAST_TARGET, JOIN_TEXT, LEAVE_TEXT};
use chrono::{DateTime, TimeDelta, Utc};
use metrics::{counter, gauge};

use crate::error::AppError;
use crate::message_log::MessageLog;
use crate::metrics::{
    PARTICIPANT_ACTIVE, PARTICIPANT_CONFLICT, PARTICIPANT_EVICTED, PARTICIPANT_HEARTBEAT,
    PARTICIPANT_REGISTERED,
};
use crate::storage::Storage;
use crate::validation;

/// Registry of everyone currently in the room
#[derive(Clone)]
pub struct ParticipantRegistry<S> {
    storage: S,
    log: MessageLog<S>,
}

impl<S: Storage + Clone> ParticipantRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self {
            log: MessageLog::new(storage.clone()),
            storage,
        }
    }

    /// Register `name` and announce the arrival to everyone.
    ///
    /// Uniqueness is enforced by the store's insert, so two concurrent
    /// registrations of one name cannot both succeed.
    pub async fn register(&self, name: Option<&str>, now: DateTime<Utc>) -> Result<Participant, AppError> {
        let name = validation::validate_name(name)?;
        let participant = Participant::new(name, now);

        if let Err(e) = self.storage.insert_participant(&participant).await {
            if matches!(e, AppError::Conflict(_)) {
                counter!(PARTICIPANT_CONFLICT).increment(1);
            }
            return Err(e);
        }

        // a registration without its join record is undone
        if let Err(e) = self
            .log
            .append(&participant.name, BROADCAST_TARGET, JOIN_TEXT, MessageKind::Status, now)
            .await
        {
            if let Err(rollback) = self.storage.remove_participant(&participant.name).await {
                tracing::error!("Failed to undo registration of {}: {}", participant.name, rollback);
            }
            return Err(e);
        }

        counter!(PARTICIPANT_REGISTERED).increment(1);
        tracing::info!("Participant {} joined", participant.name);
        self.refresh_active_gauge().await;
        Ok(participant)
    }

    /// Everyone currently registered
    pub async fn list(&self) -> Result<Vec<Participant>, AppError> {
        let participants = self.storage.list_participants().await?;
        gauge!(PARTICIPANT_ACTIVE).set(participants.len() as f64);
        Ok(participants)
    }

    async fn refresh_active_gauge(&self) {
        match self.storage.list_participants().await {
            Ok(participants) => gauge!(PARTICIPANT_ACTIVE).set(participants.len() as f64),
            Err(e) => tracing::debug!("Skipping active participant gauge update: {}", e),
        }
    }

    /// Mark `name` as alive at `now`
    pub async fn heartbeat(&self, name: Option<&str>, now: DateTime<Utc>) -> Result<(), AppError> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(AppError::NotFound("missing participant identity".to_string())),
        };

        if !self.storage.touch_participant(name, now).await? {
            return Err(AppError::NotFound(name.to_string()));
        }

        counter!(PARTICIPANT_HEARTBEAT).increment(1);
        tracing::trace!("Heartbeat from {}", name);
        Ok(())
    }

    /// Remove everyone whose last heartbeat is older than `now - threshold`
    /// and record a departure for each. Returns the evicted names.
    ///
    /// Each removal re-checks staleness inside the store, so a heartbeat
    /// landing after the stale read keeps its participant.
    pub async fn evict_stale(
        &self,
        threshold: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        let cutoff = now - threshold;
        let candidates = self.storage.stale_participants(cutoff).await?;

        let mut evicted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !self
                .storage
                .remove_participant_if_stale(&candidate.name, cutoff)
                .await?
            {
                tracing::debug!("{} came back before eviction", candidate.name);
                continue;
            }

            if let Err(e) = self
                .log
                .append(&candidate.name, BROADCAST_TARGET, LEAVE_TEXT, MessageKind::Status, now)
                .await
            {
                // restore the stale record; the next sweep retries the departure
                match self.storage.insert_participant(&candidate).await {
                    Ok(()) | Err(AppError::Conflict(_)) => {},
                    Err(restore) => {
                        tracing::error!("Failed to restore {} after eviction: {}", candidate.name, restore)
                    },
                }
                if !evicted.is_empty() {
                    self.refresh_active_gauge().await;
                }
                return Err(e);
            }

            counter!(PARTICIPANT_EVICTED).increment(1);
            tracing::info!("Participant {} left (inactive)", candidate.name);
            evicted.push(candidate.name);
        }

        if !evicted.is_empty() {
            self.refresh_active_gauge().await;
        }
        Ok(evicted)
    }

    /// The log status messages are written to
    pub fn message_log(&self) -> &MessageLog<S> {
        &self.log
    }
}
