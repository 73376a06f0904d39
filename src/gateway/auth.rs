//! Authentication sub-interface: session retrieval, passwordless sign-in,
//! sign-out, and the cancellation-guarded session watcher.

use super::GatewayError;
use crate::access::Identity;
use crate::config::RemoteConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Client for the auth endpoints next to the row store.
///
/// Holds the current access token (if any); data calls do not need it, but
/// session retrieval and sign-out do.
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    redirect_url: Option<String>,
    access_token: RwLock<Option<String>>,
}

impl AuthClient {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
            redirect_url: config.redirect_url.clone(),
            access_token: RwLock::new(None),
        }
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    fn headers(&self, bearer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        let token = bearer.unwrap_or(&self.anon_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Install the access token obtained from a completed magic-link
    /// redirect. Subsequent [`AuthClient::get_session`] calls use it.
    pub async fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write().await = Some(token.into());
    }

    /// Fetch the current identity. `None` when no token is held or the
    /// token is no longer accepted.
    pub async fn get_session(&self) -> Result<Option<Identity>, GatewayError> {
        let token = self.access_token.read().await.clone();
        let Some(token) = token else {
            return Ok(None);
        };
        let response = self
            .client
            .get(self.auth_url("user"))
            .headers(self.headers(Some(&token)))
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("session token rejected ({})", status);
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(status.as_u16(), message));
        }
        let identity: Identity = response.json().await?;
        Ok(Some(identity))
    }

    /// Request a passwordless sign-in link for `email`. The redirect target
    /// comes from the configuration when present.
    pub async fn request_magic_link(&self, email: &str) -> Result<(), GatewayError> {
        let mut url = self.auth_url("otp");
        if let Some(redirect) = &self.redirect_url {
            url = format!("{url}?redirect_to={}", urlencoding::encode(redirect));
        }
        let response = self
            .client
            .post(url)
            .headers(self.headers(None))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(status.as_u16(), message));
        }
        Ok(())
    }

    /// Revoke the session server-side and drop the held token. The token is
    /// cleared even when the revoke call fails, so the engine always sees a
    /// signed-out state afterwards.
    pub async fn sign_out(&self) -> Result<(), GatewayError> {
        let token = self.access_token.write().await.take();
        let Some(token) = token else {
            return Ok(());
        };
        let response = self
            .client
            .post(self.auth_url("logout"))
            .headers(self.headers(Some(&token)))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(status.as_u16(), message));
        }
        Ok(())
    }
}

/// Guard for delivering session results to a consumer that may have been
/// torn down.
///
/// In-flight session hydration and auth-change callbacks check the flag
/// before applying their result; there is no cancellation of the underlying
/// HTTP call itself.
#[derive(Debug, Clone, Default)]
pub struct SessionWatcher {
    cancelled: Arc<AtomicBool>,
}

impl SessionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the consumer as torn down; later deliveries become no-ops.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Apply a session result unless the watcher was cancelled first.
    /// Returns whether `apply` ran.
    pub fn deliver<F>(&self, identity: Option<Identity>, apply: F) -> bool
    where
        F: FnOnce(Option<Identity>),
    {
        if self.is_cancelled() {
            debug!("dropping stale session result after cancellation");
            return false;
        }
        apply(identity);
        true
    }
}
