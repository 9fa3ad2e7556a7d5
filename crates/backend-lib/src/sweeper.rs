// ============================
// chatroom-backend-lib/src/sweeper.rs
// ============================
//! Periodic eviction of inactive participants.
//!
//! The sweep itself is a plain function of `(registry, threshold, now)`;
//! [`spawn_sweeper`] only drives it from a tokio interval.
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::SweepSettings;
use crate::error::AppError;
use crate::metrics::SWEEP_FAILED;
use crate::registry::ParticipantRegistry;
use crate::storage::Storage;

/// Run one sweep at `now`, evicting everyone silent for longer than `threshold`
pub async fn sweep_once<S: Storage + Clone>(
    registry: &ParticipantRegistry<S>,
    threshold: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<String>, AppError> {
    let threshold = TimeDelta::from_std(threshold)
        .map_err(|e| AppError::Internal(format!("sweep threshold out of range: {e}")))?;
    registry.evict_stale(threshold, now).await
}

/// Spawn the background sweep loop. The first sweep runs one interval
/// after start. Failures are logged and the next tick tries again.
pub fn spawn_sweeper<S: Storage + Clone + 'static>(
    registry: ParticipantRegistry<S>,
    settings: &SweepSettings,
) -> JoinHandle<()> {
    let period = settings.interval();
    let threshold = settings.threshold();

    tracing::info!(
        "Inactivity sweep every {}s, threshold {}s",
        period.as_secs(),
        threshold.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match sweep_once(&registry, threshold, Utc::now()).await {
                Ok(evicted) if evicted.is_empty() => tracing::trace!("Sweep found nobody idle"),
                Ok(evicted) => tracing::info!("Evicted {} idle participant(s): {:?}", evicted.len(), evicted),
                Err(e) => {
                    counter!(SWEEP_FAILED).increment(1);
                    tracing::error!("Inactivity sweep failed: {}", e);
                },
            }
        }
    })
}
