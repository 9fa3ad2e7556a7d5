//! Sender identity carried in the `User` request header.
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Header naming the participant a request acts for
pub const USER_HEADER: &str = "user";

/// Who sent the request, if the client said
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender(pub Option<String>);

impl Sender {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<St: Send + Sync> FromRequestParts<St> for Sender {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        // names may be UTF-8, which `HeaderValue::to_str` refuses
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::to_string);
        Ok(Sender(user))
    }
}
