// ============================
// chatroom-backend-lib/src/test_support.rs
// ============================
//! Store wrappers and a metrics recorder for unit tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chatroom_common::Participant;
use chrono::{DateTime, Utc};
use metrics::{
    Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use parking_lot::Mutex;

use crate::error::AppError;
use crate::storage::{MemoryStorage, MessageDraft, Storage, StoredMessage};

/// [`MemoryStorage`] whose next `n` message appends fail
#[derive(Clone, Default)]
pub(crate) struct FailingAppends {
    pub inner: MemoryStorage,
    remaining_failures: Arc<AtomicUsize>,
}

impl FailingAppends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_appends(&self, n: usize) {
        self.remaining_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FailingAppends {
    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        self.inner.insert_participant(participant).await
    }

    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, AppError> {
        self.inner.find_participant(name).await
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, AppError> {
        self.inner.list_participants().await
    }

    async fn touch_participant(&self, name: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        self.inner.touch_participant(name, now).await
    }

    async fn remove_participant(&self, name: &str) -> Result<bool, AppError> {
        self.inner.remove_participant(name).await
    }

    async fn stale_participants(&self, cutoff: DateTime<Utc>) -> Result<Vec<Participant>, AppError> {
        self.inner.stale_participants(cutoff).await
    }

    async fn remove_participant_if_stale(
        &self,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.inner.remove_participant_if_stale(name, cutoff).await
    }

    async fn append_message(&self, draft: MessageDraft) -> Result<StoredMessage, AppError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Store("message log unavailable".to_string()));
        }
        self.inner.append_message(draft).await
    }

    async fn read_messages(&self) -> Result<Vec<StoredMessage>, AppError> {
        self.inner.read_messages().await
    }
}

#[derive(Default)]
struct GaugeCell(AtomicU64);

impl GaugeFn for GaugeCell {
    fn increment(&self, value: f64) {
        self.set(f64::from_bits(self.0.load(Ordering::SeqCst)) + value);
    }

    fn decrement(&self, value: f64) {
        self.set(f64::from_bits(self.0.load(Ordering::SeqCst)) - value);
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }
}

/// Recorder that keeps the last value of every gauge; counters and
/// histograms are dropped
#[derive(Default)]
pub(crate) struct GaugeRecorder {
    gauges: Mutex<HashMap<String, Arc<GaugeCell>>>,
}

impl GaugeRecorder {
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges
            .lock()
            .get(name)
            .map(|cell| f64::from_bits(cell.0.load(Ordering::SeqCst)))
    }
}

impl Recorder for GaugeRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        let cell = self
            .gauges
            .lock()
            .entry(key.name().to_string())
            .or_default()
            .clone();
        Gauge::from_arc(cell)
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
