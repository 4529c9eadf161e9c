// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TOKEN_FILE: &str = ".ggez-session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the GG-EZ REST API (always ends in `/`)
    pub api_base_url: String,
    /// Where the session credentials are persisted between runs
    pub token_file: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_api_url(None)
    }

    /// Load configuration from environment variables, with the base URL
    /// given explicitly (e.g. from a command-line flag).
    ///
    /// `GGEZ_API_URL` is only required when `api_url` is `None`.
    pub fn from_env_with_api_url(api_url: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = match api_url {
            Some(url) => url.to_string(),
            None => env::var("GGEZ_API_URL").map_err(|_| ConfigError::Missing("GGEZ_API_URL"))?,
        };

        let timeout_secs = match env::var("GGEZ_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("GGEZ_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url: normalize_base_url(&api_base_url)?,
            token_file: env::var("GGEZ_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE)),
            request_timeout: Duration::from_secs(timeout_secs),
            user_agent: env::var("GGEZ_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        })
    }

    /// Default config for testing only, pointed at `api_base_url`.
    pub fn test_default(api_base_url: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url)
                .unwrap_or_else(|_| "http://127.0.0.1:8000/".to_string()),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            request_timeout: Duration::from_secs(5),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("ggez-client/{}", env!("CARGO_PKG_VERSION"))
}

/// Validate a base URL and make sure relative paths join under it.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed)
        .map_err(|_| ConfigError::Invalid("GGEZ_API_URL", trimmed.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("GGEZ_API_URL", trimmed.to_string()));
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
