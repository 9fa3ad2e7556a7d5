//! JSON request bodies whose every rejection is a 422 message list.
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::validation::{self, TextFields};

/// Like `axum::Json`, but the Content-Type is not checked and malformed
/// input becomes [`AppError::Validation`]
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, St> FromRequest<St> for JsonBody<T>
where
    T: DeserializeOwned + TextFields,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Unreadable request body: {}", e);
            AppError::invalid(validation::INVALID_BODY)
        })?;
        validation::parse_body(&bytes).map(JsonBody)
    }
}
