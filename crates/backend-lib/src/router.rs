// ============================
// chatroom-backend-lib/src/router.rs
// ============================
//! HTTP router for the chatroom server.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{messages, participants},
    storage::Storage,
    AppState,
};

/// Create the HTTP router
pub fn create_router<S: Storage + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route(
            "/participants",
            post(participants::register::<S>).get(participants::list::<S>),
        )
        .route(
            "/messages",
            post(messages::post_message::<S>).get(messages::list_messages::<S>),
        )
        .route("/status", post(participants::heartbeat::<S>))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "Healthy"
}
