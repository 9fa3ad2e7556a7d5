// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers. They only translate requests into registry and message
//! log calls; the sender identity is passed down explicitly.

pub mod identity;
pub mod json_body;
pub mod messages;
pub mod participants;

pub use identity::{Sender, USER_HEADER};
pub use json_body::JsonBody;
