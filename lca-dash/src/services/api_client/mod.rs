//! Backend REST API client
//!
//! Every request carries the current session's bearer token. A 401 from any
//! endpoint other than login clears the stored session and emits
//! `DashEvent::SessionExpired`; callers receive `ClientError::Unauthorized`.
//!
//! Endpoint groups live in submodules as further `impl ApiClient` blocks.

mod auth;
mod materials;
mod products;
mod uploads;

pub use materials::ConfirmResponse;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lca_common::{DashEvent, EventBus, Store};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::models::Session;

const USER_AGENT: &str = concat!("lca-dash/", env!("CARGO_PKG_VERSION"));

/// Shared session store type
pub type SessionStore = Arc<dyn Store<Option<Session>>>;

/// Whether a 401 response ends the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthPolicy {
    /// 401 clears the session (all authenticated calls)
    ExpireOn401,
    /// 401 is just a failed attempt (login)
    Passthrough,
}

/// LCA backend client
///
/// Cloning is cheap; clones share the HTTP connection pool and session store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: SessionStore,
    events: EventBus,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionStore,
        events: EventBus,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            session,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.get() {
            Some(session) => request.bearer_auth(session.token),
            None => request,
        }
    }

    /// Send with auth, handling 401 only; other statuses are left to callers
    async fn dispatch(
        &self,
        request: RequestBuilder,
        policy: AuthPolicy,
    ) -> Result<Response, ClientError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if policy == AuthPolicy::ExpireOn401 {
                self.expire_session();
            }
            return Err(ClientError::Unauthorized);
        }

        Ok(response)
    }

    /// Send and require a success status
    async fn send(&self, request: RequestBuilder, policy: AuthPolicy) -> Result<Response, ClientError> {
        let response = self.dispatch(request, policy).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        policy: AuthPolicy,
    ) -> Result<T, ClientError> {
        let response = self.send(request, policy).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Forced client-side logout after a 401
    fn expire_session(&self) {
        if self.session.get().is_none() {
            return;
        }
        tracing::warn!("Backend rejected credentials, clearing session");
        if let Err(e) = self.session.set(None) {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
        self.events.emit_lossy(DashEvent::SessionExpired {
            timestamp: Utc::now(),
        });
    }
}

/// Pull a human message out of an error body
///
/// Accepts `{"message": ..}`, `{"error": ".."}`, `{"error": {"message": ..}}`
/// or a plain-text body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.get("error").and_then(|e| e.as_str()))
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
            })
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}
