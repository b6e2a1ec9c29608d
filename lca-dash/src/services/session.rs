//! Login, logout and admin impersonation
//!
//! The session lives in a `Store<Option<Session>>` shared with the API
//! client, so a 401 seen by any request is reflected here immediately.

use chrono::Utc;
use lca_common::{DashEvent, EventBus};

use crate::error::SessionError;
use crate::models::Session;
use crate::services::{ApiClient, SessionStore};

#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
    store: SessionStore,
    events: EventBus,
}

impl SessionService {
    pub fn new(client: ApiClient) -> Self {
        let store = client.session_store().clone();
        let events = client.events().clone();
        Self {
            client,
            store,
            events,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.store.get()
    }

    /// Require a logged-in session
    pub fn require(&self) -> Result<Session, SessionError> {
        self.current().ok_or(SessionError::NotLoggedIn)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let auth = self.client.login(email, password).await?;
        let session = Session::new(auth);
        self.store.set(Some(session.clone()))?;

        tracing::info!(user = %session.user.email, role = ?session.user.role, "Logged in");
        self.events.emit_lossy(DashEvent::LoggedIn {
            email: session.user.email.clone(),
            timestamp: Utc::now(),
        });
        Ok(session)
    }

    /// Clear the local session; the backend call is best effort
    pub async fn logout(&self) -> Result<(), SessionError> {
        if self.current().is_none() {
            return Err(SessionError::NotLoggedIn);
        }

        if let Err(e) = self.client.logout().await {
            tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
        self.store.set(None)?;

        tracing::info!("Logged out");
        self.events.emit_lossy(DashEvent::LoggedOut {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Act as another user, keeping the admin session suspended
    pub async fn impersonate(&self, user_id: &str) -> Result<Session, SessionError> {
        let admin = self.require()?;
        if let Some(impersonator) = &admin.impersonator {
            tracing::debug!(admin = %impersonator.user.email, "Nested impersonation refused");
            return Err(SessionError::AlreadyImpersonating(admin.user.email.clone()));
        }
        if !admin.user.is_admin() {
            return Err(SessionError::NotAdmin);
        }

        let auth = self.client.impersonate(user_id).await?;
        let impersonator = admin.user.email.clone();
        let mut session = Session::new(auth);
        session.impersonator = Some(Box::new(admin));
        self.store.set(Some(session.clone()))?;

        tracing::info!(
            user = %session.user.email,
            impersonator = %impersonator,
            "Impersonation started"
        );
        self.events.emit_lossy(DashEvent::ImpersonationStarted {
            email: session.user.email.clone(),
            impersonator,
            timestamp: Utc::now(),
        });
        Ok(session)
    }

    /// Restore the suspended admin session
    pub fn stop_impersonating(&self) -> Result<Session, SessionError> {
        let session = self.require()?;
        let admin = match session.impersonator {
            Some(admin) => *admin,
            None => return Err(SessionError::NotImpersonating),
        };
        self.store.set(Some(admin.clone()))?;

        tracing::info!(user = %admin.user.email, was = %session.user.email, "Impersonation stopped");
        self.events.emit_lossy(DashEvent::ImpersonationStopped {
            email: admin.user.email.clone(),
            timestamp: Utc::now(),
        });
        Ok(admin)
    }
}
