// ============================
// chatroom-backend-lib/src/lib.rs
// ============================
//! Core functionality for the chatroom HTTP server: participant presence,
//! message history and the inactivity sweep, plus the axum surface over them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod message_log;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod storage;
pub mod sweeper;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use crate::message_log::MessageLog;
use crate::registry::ParticipantRegistry;
use crate::storage::Storage;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Participant registry
    pub registry: ParticipantRegistry<S>,
    /// Message history
    pub messages: MessageLog<S>,
}

impl<S: Storage + Clone> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S) -> Self {
        Self {
            registry: ParticipantRegistry::new(storage.clone()),
            messages: MessageLog::new(storage),
        }
    }
}
