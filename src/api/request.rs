// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing request description.
//!
//! Requests are plain data rather than `reqwest::RequestBuilder`s so the
//! session can send the same request a second time after a token refresh.

use crate::error::ApiError;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// A request to the API, independent of credentials.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL (pagination links)
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

/// One multipart/form-data field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    File {
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::File {
                filename: filename.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }

    /// Flatten a form struct into text fields.
    ///
    /// `null` values are omitted; strings go as-is and everything else in its
    /// JSON form (numbers, booleans).
    pub fn from_form<T: Serialize>(form: &T) -> Result<Vec<Self>, ApiError> {
        match serde_json::to_value(form)? {
            Value::Object(map) => Ok(map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(name, value)| match value {
                    Value::String(s) => FormField::text(name, s),
                    other => FormField::text(name, other.to_string()),
                })
                .collect()),
            other => Err(ApiError::Internal(anyhow::anyhow!(
                "Form must serialize to an object, got {}",
                other
            ))),
        }
    }
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// Send a form struct as multipart/form-data.
    pub fn form<T: Serialize>(self, form: &T) -> Result<Self, ApiError> {
        Ok(self.multipart(FormField::from_form(form)?))
    }

    /// Methods that change server state and need a CSRF token.
    pub fn is_unsafe(&self) -> bool {
        !self.method.is_safe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Form {
        name: String,
        team: Option<u64>,
        active: bool,
    }

    #[test]
    fn test_form_fields_skip_nulls() {
        let fields = FormField::from_form(&Form {
            name: "s1mple".to_string(),
            team: None,
            active: true,
        })
        .unwrap();

        let pairs: Vec<(String, String)> = fields
            .into_iter()
            .map(|f| match f.value {
                FieldValue::Text(v) => (f.name, v),
                FieldValue::File { .. } => unreachable!(),
            })
            .collect();
        assert!(pairs.contains(&("name".to_string(), "s1mple".to_string())));
        assert!(pairs.contains(&("active".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "team"));
    }

    #[test]
    fn test_form_rejects_non_objects() {
        assert!(FormField::from_form(&"just a string").is_err());
    }

    #[test]
    fn test_query_pairs_accumulate() {
        let request = ApiRequest::get("matches/")
            .query("page", "2")
            .query("status", "completed");
        assert_eq!(
            request.query,
            [
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "completed".to_string())
            ]
        );
    }

    #[test]
    fn test_unsafe_methods() {
        assert!(!ApiRequest::get("events/").is_unsafe());
        assert!(ApiRequest::post("events/").is_unsafe());
        assert!(ApiRequest::delete("events/1/").is_unsafe());
    }
}
