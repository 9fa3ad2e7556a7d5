// ============================
// crates/backend-lib/src/handlers/participants.rs
// ============================
//! `/participants` and `/status`.
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chatroom_common::{NewParticipant, Participant};
use chrono::Utc;

use super::{JsonBody, Sender};
use crate::{error::AppError, storage::Storage, AppState};

/// `POST /participants`
pub async fn register<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(body): JsonBody<NewParticipant>,
) -> Result<StatusCode, AppError> {
    state.registry.register(body.name.as_deref(), Utc::now()).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /participants`
pub async fn list<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Participant>>, AppError> {
    Ok(Json(state.registry.list().await?))
}

/// `POST /status`: heartbeat for the sender
pub async fn heartbeat<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    sender: Sender,
) -> Result<StatusCode, AppError> {
    state.registry.heartbeat(sender.as_deref(), Utc::now()).await?;
    Ok(StatusCode::OK)
}
