// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Field-level input problems, one human-readable line each
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Participant already exists: {0}")]
    Conflict(String),

    #[error("Participant not found: {0}")]
    NotFound(String),

    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-message validation failure
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnknownSender(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            },
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::Conflict(_) => "PART_001",
            AppError::NotFound(_) => "PART_002",
            AppError::UnknownSender(_) => "MSG_001",
            AppError::Store(_) => "STORE_001",
            AppError::Config(_) => "CFG_001",
            AppError::Internal(_) => "INT_001",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::Validation(messages) => (status, Json(messages)).into_response(),
            AppError::UnknownSender(name) => {
                let message = format!("\"from\" must be a registered participant ({name})");
                (status, Json(vec![message])).into_response()
            },
            AppError::Conflict(_) | AppError::NotFound(_) => status.into_response(),
            other => {
                let body = serde_json::json!({
                    "error": {
                        "code": other.error_code(),
                        "message": other.to_string(),
                    }
                });
                (status, Json(body)).into_response()
            },
        }
    }
}

// Both only reach `AppError` from the store, so they surface as store failures.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Store(format!("io: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(format!("corrupt record: {err}"))
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");

        let store_error: AppError = IoError::new(ErrorKind::NotFound, "File not found").into();
        assert_eq!(store_error.to_string(), "Store error: io: File not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::invalid("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::UnknownSender("ghost".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Conflict("alice".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NotFound("bob".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Store("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_from_impls() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "Permission denied");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Store(_)));
        assert_eq!(app_err.error_code(), "STORE_001");

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert_eq!(app_err.error_code(), "STORE_001");
        assert_eq!(app_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let app_err: AppError = figment::Error::from("bad key".to_string()).into();
        assert_eq!(app_err.error_code(), "CFG_001");
    }

    #[tokio::test]
    async fn test_validation_renders_message_array() {
        let response = AppError::Validation(vec!["\"name\" is required".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let messages: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(messages, vec!["\"name\" is required".to_string()]);
    }

    #[tokio::test]
    async fn test_conflict_has_empty_body() {
        let response = AppError::Conflict("alice".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_serialization() {
        let response = AppError::Store("connection reset".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "STORE_001");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("connection reset"));
    }
}
