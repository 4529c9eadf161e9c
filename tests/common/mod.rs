// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::HeaderMap;
use axum::Router;
use ggez_client::config::Config;
use ggez_client::store::{keys, MemoryTokenStore, TokenStore};
use ggez_client::AppState;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Start a stub backend on a random local port.
///
/// `build` gets the base URL (with trailing slash) so handlers can hand out
/// absolute pagination links. Returns the same base URL.
#[allow(dead_code)]
pub async fn serve(build: impl FnOnce(&str) -> Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub backend");
    let addr = listener.local_addr().expect("No local address");
    let base = format!("http://{}/", addr);

    let app = build(&base);
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    base
}

/// Start a stub backend that does not need its own URL.
#[allow(dead_code)]
pub async fn spawn(app: Router) -> String {
    serve(|_| app).await
}

/// Counts calls to one stub endpoint and remembers the credentials it saw.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<AtomicUsize>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call and return its `Authorization` header.
    pub fn hit(&self, headers: &HeaderMap) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth.lock().unwrap().push(auth.clone());
        auth
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.auth.lock().unwrap().clone()
    }
}

/// App state over an in-memory token store, pointed at `base`.
#[allow(dead_code)]
pub fn test_app(base: &str) -> (AppState, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let state = AppState::new(Config::test_default(base), tokens.clone())
        .expect("Failed to create app state");
    (state, tokens)
}

/// App state with credentials already stored, as after an earlier sign-in.
#[allow(dead_code)]
pub fn signed_in_app(
    base: &str,
    access: &str,
    refresh: Option<&str>,
) -> (AppState, Arc<MemoryTokenStore>) {
    let (state, tokens) = test_app(base);
    tokens.set(keys::ACCESS_TOKEN, access);
    if let Some(refresh) = refresh {
        tokens.set(keys::REFRESH_TOKEN, refresh);
    }
    (state, tokens)
}

/// A signed JWT access token that expires `secs` from now.
#[allow(dead_code)]
pub fn jwt_expiring_in(secs: i64) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    let claims = Claims {
        sub: "1".to_string(),
        exp: chrono::Utc::now().timestamp() + secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("Failed to encode JWT")
}

/// Bearer value for `token`.
#[allow(dead_code)]
pub fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {}", token))
}
