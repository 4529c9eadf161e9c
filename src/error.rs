// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types with a consistent shape for consumer views.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key the backend uses for errors that belong to no single form field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Key DRF uses for a single top-level error message.
const DETAIL: &str = "detail";

/// Application error type returned by every API and session operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Whether this error means the session credentials were rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    /// Classify a non-success response.
    ///
    /// `what` names the requested resource and is used for `NotFound`.
    pub fn from_status(status: StatusCode, body: &str, what: &str) -> Self {
        match status.as_u16() {
            400 | 422 => match ValidationErrors::from_body(body) {
                Some(errors) => ApiError::Validation(errors),
                None => ApiError::Status {
                    status: status.as_u16(),
                    body: body.to_string(),
                },
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(what.to_string()),
            code => ApiError::Status {
                status: code,
                body: body.to_string(),
            },
        }
    }

    /// Messages suitable for showing next to a form.
    ///
    /// Errors without field information become a single non-field message.
    pub fn into_validation_errors(self) -> ValidationErrors {
        match self {
            ApiError::Validation(errors) => errors,
            other => ValidationErrors::non_field(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Field-keyed error messages, as returned by the backend on 400.
///
/// `{"username": ["This field is required."], "non_field_errors": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// A single message not tied to a field.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    /// Parse an error body. Returns `None` if it is not a JSON object.
    ///
    /// Values may be lists of strings, bare strings, or nested objects;
    /// anything that is not a string is kept in its JSON form. A top-level
    /// `detail` is folded into the non-field messages.
    pub fn from_body(body: &str) -> Option<Self> {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return None;
        };

        let mut errors = Self::default();
        for (key, value) in map {
            let key = if key == DETAIL {
                NON_FIELD_ERRORS.to_string()
            } else {
                key
            };
            match value {
                Value::Array(items) => {
                    for item in items {
                        errors.add(&key, message_text(item));
                    }
                }
                other => errors.add(&key, message_text(other)),
            }
        }
        Some(errors)
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field (empty if none).
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field_errors(&self) -> &[String] {
        self.field(NON_FIELD_ERRORS)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = Self::default();
        for (field, field_errors) in source.field_errors() {
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                errors.add(field.as_ref(), message);
            }
        }
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                if field == NON_FIELD_ERRORS {
                    write!(f, "{}", message)?;
                } else {
                    write!(f, "{}: {}", field, message)?;
                }
            }
        }
        Ok(())
    }
}

fn message_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
