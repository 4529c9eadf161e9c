// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GG-EZ API client.
//!
//! Handles:
//! - Base URL resolution (relative paths and absolute pagination links)
//! - Per-request bearer authentication
//! - Cookie credentials and the CSRF header for unsafe methods
//! - Mapping error statuses onto `ApiError`
//!
//! Refreshing expired credentials is the session controller's job; this
//! client only sends what it is given.

use crate::api::request::{ApiRequest, FieldValue, RequestBody};
use crate::config::Config;
use crate::error::ApiError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Cookie the backend sets with the CSRF token.
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Header the backend expects the CSRF token in.
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// Shared HTTP client, configured once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    cookies: Arc<Jar>,
}

/// Successful response with its body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::Decode(format!("JSON parse error: {}", e)))
    }
}

impl ApiClient {
    /// Create a client for `config.api_base_url`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ApiError::Internal(anyhow::anyhow!(
                "Invalid API base URL {}: {}",
                config.api_base_url,
                e
            ))
        })?;

        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .cookie_provider(cookies.clone())
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            cookies,
        })
    }

    /// Resolve a request path against the base URL.
    ///
    /// Absolute URLs are used as-is; relative paths always land under the
    /// base path, with or without a leading slash.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid URL {}: {}", path, e)));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid path {}: {}", path, e)))
    }

    /// Whether credentials may be attached to requests for `url`.
    pub fn is_api_origin(&self, url: &Url) -> bool {
        url.origin() == self.base_url.origin()
    }

    /// Current CSRF token from the cookie jar, if the backend has set one.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE_NAME).then(|| value.to_string())
        })
    }

    /// Send a request, attaching `access_token` as a bearer credential.
    ///
    /// The token is only attached for URLs on the API origin. Non-success
    /// statuses come back as the matching `ApiError` variant.
    pub async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.resolve(&request.path)?;
        let same_origin = self.is_api_origin(&url);

        let mut builder = self.http.request(request.method.clone(), url.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if same_origin {
            if let Some(token) = access_token {
                builder = builder.bearer_auth(token);
            }
            if request.is_unsafe() {
                if let Some(csrf) = self.csrf_token() {
                    builder = builder.header(CSRF_HEADER_NAME, csrf);
                }
            }
        } else if access_token.is_some() {
            tracing::debug!(host = ?url.host_str(), "Not sending credentials to foreign origin");
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, path = %request.path, error = %e, "Request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            authenticated = same_origin && access_token.is_some(),
            "API request"
        );

        if status.is_success() {
            return Ok(ApiResponse { status, body });
        }

        if status.is_server_error() {
            tracing::warn!(status = %status, path = %request.path, "API server error");
        }

        Err(ApiError::from_status(status, &body, &request.path))
    }
}

fn build_form(fields: &[crate::api::request::FormField]) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match &field.value {
            FieldValue::Text(value) => form.text(field.name.clone(), value.clone()),
            FieldValue::File {
                filename,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes.clone())
                    .file_name(filename.clone())
                    .mime_str(mime)
                    .map_err(|e| {
                        ApiError::Internal(anyhow::anyhow!("Invalid MIME type {}: {}", mime, e))
                    })?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}
