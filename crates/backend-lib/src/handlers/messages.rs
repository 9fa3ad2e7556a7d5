// ============================
// crates/backend-lib/src/handlers/messages.rs
// ============================
//! `/messages`.
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chatroom_common::{ChatMessage, MessagesQuery, NewMessage};
use chrono::Utc;

use super::{JsonBody, Sender};
use crate::{error::AppError, message_log, storage::Storage, validation, AppState};

/// `POST /messages`
pub async fn post_message<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    sender: Sender,
    JsonBody(body): JsonBody<NewMessage>,
) -> Result<StatusCode, AppError> {
    let message = validation::validate_message(sender.as_deref(), &body)?;
    state.messages.append_user_message(message, Utc::now()).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /messages?limit=N`
pub async fn list_messages<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    sender: Sender,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let limit = validation::parse_limit(query.limit.as_deref())?;
    let visible = state.messages.retrieve(sender.as_deref(), limit).await?;

    tracing::debug!("{} message(s) visible to {:?}", visible.len(), sender.as_deref());
    Ok(Json(visible.iter().map(message_log::render).collect()))
}
