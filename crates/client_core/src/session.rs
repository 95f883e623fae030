//! Authentication state: token plus the current user's profile.
//!
//! The token is the only value other stores need; it is handed to them
//! per call rather than read out of a global. An absent token means
//! logged out and always implies an absent user.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use shared::{
    domain::{PasswordChange, UserPatch, UserProfile},
    envelope,
    error::ApiError,
};

use crate::{
    executor::{ApiBody, RequestExecutor},
    prefs::PrefsStore,
};

/// Substrings in an error message that mean the stored token is no
/// longer honored and the session must be evicted.
const AUTH_FAILURE_INDICATORS: &[&str] = &["401", "token", "unauthorized"];

fn is_auth_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    AUTH_FAILURE_INDICATORS
        .iter()
        .any(|needle| lower.contains(needle))
}

/// The services have shipped the token under several names; check the
/// known locations in order.
pub fn extract_token(body: &Value) -> Option<String> {
    body.get("token")
        .or_else(|| body.get("data").and_then(|data| data.get("token")))
        .or_else(|| body.get("accessToken"))
        .or_else(|| body.get("satoken"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub error: Option<String>,
}

#[derive(Default)]
struct SessionInner {
    token: Option<String>,
    user: Option<UserProfile>,
    loading: bool,
    error: Option<String>,
}

pub struct SessionStore {
    executor: RequestExecutor,
    prefs: Arc<dyn PrefsStore>,
    inner: Mutex<SessionInner>,
}

impl SessionStore {
    pub fn new(executor: RequestExecutor, prefs: Arc<dyn PrefsStore>) -> Self {
        Self {
            executor,
            prefs,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Reads the persisted token at startup. The profile itself is not
    /// fetched here; a `LoggedIn` state without a resolved user is
    /// valid until [`SessionStore::load`] completes.
    pub async fn restore(&self) {
        let token = match self.prefs.token().await {
            Ok(token) => token,
            Err(err) => {
                warn!("failed to read persisted token: {err:#}");
                None
            }
        };
        let mut inner = self.inner.lock().await;
        inner.token = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.token.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            token: inner.token.clone(),
            user: inner.user.clone(),
            error: inner.error.clone(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        {
            let mut inner = self.inner.lock().await;
            inner.loading = true;
            inner.error = None;
        }

        let result = self.login_inner(username, password).await;

        let mut inner = self.inner.lock().await;
        inner.loading = false;
        match result {
            Ok((token, user)) => {
                inner.token = Some(token);
                if user.is_some() {
                    inner.user = user;
                }
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn login_inner(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, Option<UserProfile>), ApiError> {
        let body = self
            .executor
            .send_json(
                Method::POST,
                "/api/users/login",
                serde_json::to_value(LoginRequest { username, password })
                    .map_err(|err| ApiError::Decode(err.to_string()))?,
                None,
            )
            .await?
            .into_json()?;
        envelope::expect_success(&body, "login failed")?;

        let token = extract_token(&body).ok_or(ApiError::MissingToken)?;
        if let Err(err) = self.prefs.set_token(&token).await {
            warn!("failed to persist token: {err:#}");
        }

        // Some deployments return the profile with the token.
        let user = body
            .get("user")
            .or_else(|| body.get("data").and_then(|data| data.get("user")))
            .and_then(|user| serde_json::from_value(user.clone()).ok());

        info!(username, "logged in");
        Ok((token, user))
    }

    /// Clears the session unconditionally. A storage failure is logged
    /// but never surfaced; logout cannot fail.
    pub async fn logout(&self) {
        if let Err(err) = self.prefs.clear_token().await {
            warn!("failed to clear persisted token: {err:#}");
        }
        let mut inner = self.inner.lock().await;
        inner.token = None;
        inner.user = None;
        inner.error = None;
    }

    /// Fetches the profile for the stored token. No-op when logged out
    /// or while another load is in flight. An authentication failure
    /// evicts the session instead of surfacing the error.
    pub async fn load(&self) -> Result<(), ApiError> {
        let token = {
            let mut inner = self.inner.lock().await;
            if inner.loading {
                return Ok(());
            }
            let Some(token) = inner.token.clone() else {
                return Ok(());
            };
            inner.loading = true;
            inner.error = None;
            token
        };

        let result = self.load_inner(&token).await;

        let mut inner = self.inner.lock().await;
        inner.loading = false;
        match result {
            Ok(user) => {
                inner.user = Some(user);
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                inner.error = Some(message.clone());
                if is_auth_failure(&message) {
                    inner.token = None;
                    inner.user = None;
                    drop(inner);
                    if let Err(persist_err) = self.prefs.clear_token().await {
                        warn!("failed to clear persisted token: {persist_err:#}");
                    }
                    info!("session evicted after authentication failure: {message}");
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn load_inner(&self, token: &str) -> Result<UserProfile, ApiError> {
        let body = self
            .executor
            .get("/api/users/profile", &[], Some(token))
            .await?
            .into_json()?;
        envelope::expect_success(&body, "profile load failed")?;
        envelope::normalize_item(body)
    }

    /// Guarded no-op when logged out. On success the cached user is
    /// replaced with the server's returned representation.
    pub async fn update_profile(&self, patch: &UserPatch) -> Result<(), ApiError> {
        let Some(token) = self.begin_authed_call().await else {
            return Ok(());
        };

        let result: Result<UserProfile, ApiError> = async {
            let body = self
                .executor
                .send_json(
                    Method::PUT,
                    "/api/users/profile",
                    serde_json::to_value(patch)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    Some(&token),
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "profile update failed")?;
            envelope::normalize_item(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        inner.loading = false;
        match result {
            Ok(user) => {
                inner.user = Some(user);
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let Some(token) = self.begin_authed_call().await else {
            return Ok(());
        };

        let result: Result<(), ApiError> = async {
            let body = self
                .executor
                .send_json(
                    Method::PUT,
                    "/api/users/password",
                    serde_json::to_value(change)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    Some(&token),
                )
                .await?;
            // The acknowledgment body is uninteresting; only an
            // envelope failure code matters.
            if let ApiBody::Json(body) = body {
                envelope::expect_success(&body, "password update failed")?;
            }
            Ok(())
        }
        .await;

        let mut inner = self.inner.lock().await;
        inner.loading = false;
        if let Err(err) = &result {
            inner.error = Some(err.to_string());
        }
        result
    }

    async fn begin_authed_call(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let token = inner.token.clone()?;
        inner.loading = true;
        inner.error = None;
        Some(token)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
