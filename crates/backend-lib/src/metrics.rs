// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const PARTICIPANT_REGISTERED: &str = "participant.registered";
pub const PARTICIPANT_CONFLICT: &str = "participant.conflict";
pub const PARTICIPANT_HEARTBEAT: &str = "participant.heartbeat";
pub const PARTICIPANT_EVICTED: &str = "participant.evicted";
pub const PARTICIPANT_ACTIVE: &str = "participant.active";
pub const MESSAGE_POSTED: &str = "message.posted";
pub const MESSAGE_REJECTED: &str = "message.rejected";
pub const SWEEP_FAILED: &str = "sweep.failed";
