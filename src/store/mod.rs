// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side credential storage.
//!
//! The store is a plain string key-value map. It performs no network calls
//! and no validation; the session controller decides what goes in it.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Key names as constants.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
}

/// Durable holder for the access/refresh credential pair.
///
/// Implementations never fail from the caller's point of view. A backend
/// that cannot persist keeps working from memory instead.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self, key: &str);
}

/// Credential pair as read from or written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn load(store: &dyn TokenStore) -> Option<Self> {
        Some(Self {
            access_token: store.get(keys::ACCESS_TOKEN)?,
            refresh_token: store.get(keys::REFRESH_TOKEN),
        })
    }

    /// Write both keys. A missing refresh token clears any stale one.
    pub fn save(&self, store: &dyn TokenStore) {
        store.set(keys::ACCESS_TOKEN, &self.access_token);
        match &self.refresh_token {
            Some(refresh) => store.set(keys::REFRESH_TOKEN, refresh),
            None => store.clear(keys::REFRESH_TOKEN),
        }
    }
}

/// Remove both credential keys.
pub fn clear_credentials(store: &dyn TokenStore) {
    store.clear(keys::ACCESS_TOKEN);
    store.clear(keys::REFRESH_TOKEN);
}
