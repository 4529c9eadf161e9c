// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session controller: sign-in, sign-out, current user and token refresh.
//!
//! States cycle between `Anonymous` and `Authenticated`:
//! - login: `Anonymous -> Authenticating -> Authenticated | Anonymous`
//! - logout: `-> Authenticating -> Anonymous`, even if the remote call fails
//! - 401: `-> Expiring -> (previous) | Anonymous`
//! - restore at startup: `Anonymous -> Authenticating -> Authenticated | Anonymous`
//!
//! Every authenticated request goes through [`SessionController::send`],
//! which refreshes at most once per request and retries once.

use crate::api::{endpoints, ApiClient, ApiRequest, ApiResponse};
use crate::error::{ApiError, Result};
use crate::models::{Registration, Role, UserProfile};
use crate::services::token_expiry::expires_within;
use crate::store::{clear_credentials, keys, TokenPair, TokenStore};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use validator::Validate;

/// Refresh a JWT access token this long before it expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Login, logout or startup restore in flight
    Authenticating,
    Authenticated,
    /// A request was rejected and a refresh is in flight
    Expiring,
}

/// What consumer views see of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<UserProfile>,
}

/// Login response. dj-rest-auth names the tokens `access`/`refresh` or
/// `access_token`/`refresh_token` depending on its version; with HTTP-only
/// JWT cookies they are absent or empty.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default, alias = "access")]
    access_token: Option<String>,
    #[serde(default, alias = "refresh")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(alias = "access")]
    access_token: String,
    /// Present when the backend rotates refresh tokens
    #[serde(default, alias = "refresh")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleResponse {
    role: Role,
}

/// Owner of the session state and the only writer of the token store.
///
/// Shared behind an `Arc`; views read through [`snapshot`](Self::snapshot)
/// or a [`subscribe`](Self::subscribe) receiver.
pub struct SessionController {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes refreshes so concurrent 401s share one refresh call.
    refresh_lock: Mutex<()>,
    /// Bumped on logout and reset; results of older operations are dropped.
    epoch: AtomicU64,
}

impl SessionController {
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            api,
            tokens,
            state,
            refresh_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().state
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    /// Receiver that sees every published session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn has_credentials(&self) -> bool {
        self.tokens.get(keys::ACCESS_TOKEN).is_some()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Restore a session from stored credentials at startup.
    ///
    /// Returns the user if the stored token is still good. Without stored
    /// credentials nothing is sent and the session stays anonymous.
    pub async fn restore(&self) -> Option<UserProfile> {
        if !self.has_credentials() {
            tracing::debug!("No stored credentials, staying anonymous");
            return None;
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(SessionState::Authenticating);

        match self.fetch_profile().await {
            Ok(profile) => {
                let published = profile.clone();
                let committed = self.commit_if_current(epoch, |snapshot| {
                    snapshot.state = SessionState::Authenticated;
                    snapshot.user = Some(published);
                });
                if !committed {
                    tracing::debug!("Session reset during restore, dropping result");
                    return None;
                }
                tracing::info!(username = %profile.username, "Session restored");
                Some(profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored credentials rejected, clearing session");
                if self.is_current(epoch) {
                    self.reset();
                }
                None
            }
        }
    }

    /// Sign in with username and password.
    ///
    /// Field and non-field messages from the backend come back as
    /// `ApiError::Validation`. Any failure leaves the session anonymous.
    ///
    /// Signing in always starts from an anonymous session: an existing
    /// session (or stored credentials) is logged out first, so a failed
    /// attempt never leaves the previous user half signed in.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        if self.state() != SessionState::Anonymous || self.has_credentials() {
            tracing::info!("Ending the current session before signing in");
            self.logout().await;
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(SessionState::Authenticating);
        tracing::info!(username, "Signing in");

        match self.authenticate(epoch, username, password).await {
            Ok(profile) => {
                tracing::info!(username = %profile.username, role = ?profile.role, "Signed in");
                Ok(profile)
            }
            Err(e) => {
                tracing::info!(username, error = %e, "Sign-in failed");
                if self.is_current(epoch) {
                    self.reset();
                }
                Err(e)
            }
        }
    }

    async fn authenticate(&self, epoch: u64, username: &str, password: &str) -> Result<UserProfile> {
        let request = ApiRequest::post(endpoints::LOGIN).json(json!({
            "username": username,
            "password": password,
        }));
        let login: LoginResponse = self.api.send(&request, None).await?.json()?;

        match non_empty(login.access_token) {
            Some(access_token) => {
                let pair = TokenPair {
                    access_token,
                    refresh_token: non_empty(login.refresh_token),
                };
                if !self.commit_if_current(epoch, |_| pair.save(self.tokens.as_ref())) {
                    return Err(superseded());
                }
            }
            None => {
                tracing::debug!("Login response carried no tokens, relying on session cookies");
            }
        }

        let profile = self.fetch_profile().await?;
        let published = profile.clone();
        let committed = self.commit_if_current(epoch, |snapshot| {
            snapshot.state = SessionState::Authenticated;
            snapshot.user = Some(published);
        });
        if !committed {
            return Err(superseded());
        }
        Ok(profile)
    }

    /// Sign out. Always succeeds locally; the remote call is best-effort.
    pub async fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.set_state(SessionState::Authenticating);

        let token = self.tokens.get(keys::ACCESS_TOKEN);
        let request = ApiRequest::post(endpoints::LOGOUT);
        if let Err(e) = self.api.send(&request, token.as_deref()).await {
            tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
        }

        self.reset();
        tracing::info!("Signed out");
    }

    /// Create an account. Does not sign in.
    ///
    /// The form is checked locally first; local and remote problems both
    /// come back as `ApiError::Validation`.
    pub async fn register(&self, form: &Registration) -> Result<()> {
        form.validate()
            .map_err(|e| ApiError::Validation(e.into()))?;

        let request = ApiRequest::post(endpoints::REGISTRATION).json(serde_json::to_value(form)?);
        self.api.send(&request, None).await?;

        tracing::info!(username = %form.username, role = %form.role, "Account registered");
        Ok(())
    }

    /// Fetch the user and, if the user endpoint omits it, the role.
    async fn fetch_profile(&self) -> Result<UserProfile> {
        let profile: UserProfile = self.send(&ApiRequest::get(endpoints::USER)).await?.json()?;
        if profile.role.is_some() {
            return Ok(profile);
        }

        let role = match self.send(&ApiRequest::get(endpoints::CURRENT_USER_ROLE)).await {
            Ok(response) => response.json::<RoleResponse>(),
            Err(e) => Err(e),
        };
        match role {
            Ok(role) => Ok(profile.with_role(role.role)),
            Err(e) => {
                tracing::warn!(error = %e, "Role lookup failed, continuing without role");
                Ok(profile)
            }
        }
    }

    // ─── Authenticated Requests ──────────────────────────────────────────────

    /// Send a request with the stored access token.
    ///
    /// On 401 the credentials are refreshed (at most once for this request)
    /// and the request is retried once. If the refresh fails the session is
    /// cleared and the caller gets the original `Unauthorized`.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let (token, refreshed) = self.access_token_for_request().await;

        let stale = match self.api.send(request, token.as_deref()).await {
            Err(ApiError::Unauthorized) => token,
            other => return other,
        };

        if refreshed {
            return Err(ApiError::Unauthorized);
        }
        if stale.is_none() && self.tokens.get(keys::REFRESH_TOKEN).is_none() {
            // Anonymous request to a protected endpoint: nothing to refresh.
            return Err(ApiError::Unauthorized);
        }

        tracing::debug!(path = %request.path, "Request rejected, refreshing credentials");
        if self.refresh_after(stale.as_deref()).await.is_err() {
            return Err(ApiError::Unauthorized);
        }

        let fresh = self.tokens.get(keys::ACCESS_TOKEN);
        self.api.send(request, fresh.as_deref()).await
    }

    /// Refresh the access token now.
    pub async fn refresh(&self) -> Result<()> {
        let current = self.tokens.get(keys::ACCESS_TOKEN);
        self.refresh_after(current.as_deref()).await
    }

    /// Token to send, refreshing first if a JWT is about to expire.
    ///
    /// The flag is true if a refresh was attempted for this request.
    async fn access_token_for_request(&self) -> (Option<String>, bool) {
        let Some(pair) = TokenPair::load(self.tokens.as_ref()) else {
            return (None, false);
        };

        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if pair.refresh_token.is_none() || !expires_within(&pair.access_token, margin, Utc::now()) {
            return (Some(pair.access_token), false);
        }

        tracing::debug!("Access token about to expire, refreshing early");
        match self.refresh_after(Some(&pair.access_token)).await {
            Ok(()) => (self.tokens.get(keys::ACCESS_TOKEN), true),
            Err(_) => (None, true),
        }
    }

    /// Replace the access token that `stale` was, unless someone already did.
    ///
    /// Callers that queue on the lock while another refresh runs find a
    /// different token in the store when they get in and return without
    /// calling the refresh endpoint again.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens.get(keys::ACCESS_TOKEN);
        if current.is_some() && current.as_deref() != stale {
            tracing::debug!("Credentials already refreshed by a concurrent request");
            return Ok(());
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let Some(refresh_token) = self.tokens.get(keys::REFRESH_TOKEN) else {
            tracing::info!("No refresh token available, signing out");
            self.reset();
            return Err(ApiError::Unauthorized);
        };

        let previous = self.replace_state(SessionState::Expiring);

        let request =
            ApiRequest::post(endpoints::TOKEN_REFRESH).json(json!({ "refresh": refresh_token }));
        let result = match self.api.send(&request, None).await {
            Ok(response) => response.json::<RefreshResponse>(),
            Err(e) => Err(e),
        };

        match result {
            Ok(refreshed) => {
                let committed = self.commit_if_current(epoch, |snapshot| {
                    self.tokens.set(keys::ACCESS_TOKEN, &refreshed.access_token);
                    if let Some(rotated) = refreshed.refresh_token.as_deref().filter(|t| !t.is_empty()) {
                        self.tokens.set(keys::REFRESH_TOKEN, rotated);
                    }
                    snapshot.state = previous;
                });
                if !committed {
                    return Err(superseded());
                }
                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, signing out");
                if self.is_current(epoch) {
                    self.reset();
                }
                Err(ApiError::Unauthorized)
            }
        }
    }

    // ─── State Helpers ───────────────────────────────────────────────────────

    fn set_state(&self, state: SessionState) {
        self.replace_state(state);
    }

    fn replace_state(&self, state: SessionState) -> SessionState {
        let mut previous = state;
        self.state.send_if_modified(|snapshot| {
            previous = std::mem::replace(&mut snapshot.state, state);
            previous != state
        });
        previous
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Run `commit` under the state lock if no reset happened since `epoch`.
    fn commit_if_current(&self, epoch: u64, commit: impl FnOnce(&mut SessionSnapshot)) -> bool {
        let mut committed = false;
        self.state.send_if_modified(|snapshot| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            let before = snapshot.clone();
            commit(snapshot);
            committed = true;
            *snapshot != before
        });
        committed
    }

    /// Drop credentials and user, invalidating in-flight operations.
    fn reset(&self) {
        self.state.send_modify(|snapshot| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            clear_credentials(self.tokens.as_ref());
            *snapshot = SessionSnapshot::default();
        });
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Error for an operation overtaken by logout.
fn superseded() -> ApiError {
    tracing::debug!("Session changed while the operation was in flight");
    ApiError::Unauthorized
}
