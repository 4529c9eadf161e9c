// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GG-EZ client: session handling and typed access to the esports
//! event-tracking API.
//!
//! This crate provides the front-end core shared by the GG-EZ views: it
//! keeps the signed-in session (tokens, current user, refresh) and exposes
//! events, matches, teams and players from the REST backend.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod services;
pub mod store;
pub mod time_utils;

use api::ApiClient;
use config::Config;
use error::ApiError;
use services::{ResourceService, SessionController};
use std::sync::Arc;
use store::TokenStore;

/// Shared application state handed to views.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionController>,
    pub resources: ResourceService,
}

impl AppState {
    pub fn new(config: Config, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let session = Arc::new(SessionController::new(api, tokens));
        let resources = ResourceService::new(session.clone());
        Ok(Self {
            config,
            session,
            resources,
        })
    }
}
