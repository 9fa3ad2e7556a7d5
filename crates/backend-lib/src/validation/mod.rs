// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.
//!
//! Every check collects its failures into a list of readable lines so a
//! client sees all of its mistakes at once.

use std::num::IntErrorKind;

use chatroom_common::{MessageKind, NewMessage, NewParticipant};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Minimum length of a participant name, also applied to `from` and `to`
pub const MIN_NAME_LENGTH: usize = 3;

/// A message body that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

fn check_name_field(field: &str, value: Option<&str>, errors: &mut Vec<String>) {
    match value {
        None => errors.push(format!("\"{field}\" is required")),
        Some("") => errors.push(format!("\"{field}\" is not allowed to be empty")),
        Some(v) if v.chars().count() < MIN_NAME_LENGTH => errors.push(format!(
            "\"{field}\" length must be at least {MIN_NAME_LENGTH} characters long"
        )),
        Some(_) => {},
    }
}

/// Validate a participant name
pub fn validate_name(name: Option<&str>) -> Result<String, AppError> {
    let mut errors = Vec::new();
    check_name_field("name", name, &mut errors);

    match name {
        Some(name) if errors.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validate a message body together with the sender taken from the request
pub fn validate_message(from: Option<&str>, body: &NewMessage) -> Result<ValidMessage, AppError> {
    let mut errors = Vec::new();

    check_name_field("from", from, &mut errors);
    check_name_field("to", body.to.as_deref(), &mut errors);

    match body.text.as_deref() {
        None => errors.push("\"text\" is required".to_string()),
        Some("") => errors.push("\"text\" is not allowed to be empty".to_string()),
        Some(_) => {},
    }

    let kind = match body.kind.as_deref() {
        None => {
            errors.push("\"type\" is required".to_string());
            None
        },
        Some(raw) => {
            let kind = MessageKind::parse_user_kind(raw);
            if kind.is_none() {
                errors.push("\"type\" must be one of [message, private_message]".to_string());
            }
            kind
        },
    };

    match (from, &body.to, &body.text, kind) {
        (Some(from), Some(to), Some(text), Some(kind)) if errors.is_empty() => Ok(ValidMessage {
            from: from.to_string(),
            to: to.clone(),
            text: text.clone(),
            kind,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Reported for a body that is not a JSON object
pub const INVALID_BODY: &str = "body must be a valid JSON object";

/// Request bodies name the fields that must hold strings when present
pub trait TextFields {
    const TEXT_FIELDS: &'static [&'static str];
}

impl TextFields for NewParticipant {
    const TEXT_FIELDS: &'static [&'static str] = &["name"];
}

impl TextFields for NewMessage {
    const TEXT_FIELDS: &'static [&'static str] = &["to", "text", "type"];
}

/// Decode a request body. An empty body counts as `{}` so the field checks
/// report what is missing.
pub fn parse_body<T: DeserializeOwned + TextFields>(bytes: &[u8]) -> Result<T, AppError> {
    let object = if bytes.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(object)) => object,
            _ => return Err(AppError::invalid(INVALID_BODY)),
        }
    };

    let errors: Vec<String> = T::TEXT_FIELDS
        .iter()
        .filter(|field| matches!(object.get(**field), Some(v) if !v.is_string() && !v.is_null()))
        .map(|field| format!("\"{field}\" must be a string"))
        .collect();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| {
        tracing::debug!("Body did not match its shape: {}", e);
        AppError::invalid(INVALID_BODY)
    })
}

/// Parse the raw `limit` query value. Absent means "no truncation".
/// Integers past the `i64` range are clamped.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match raw.trim().parse::<i64>() {
        Ok(limit) => Ok(Some(limit)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(Some(i64::MAX)),
            IntErrorKind::NegOverflow => Ok(Some(i64::MIN)),
            _ => Err(AppError::invalid("\"limit\" must be a number")),
        },
    }
}
