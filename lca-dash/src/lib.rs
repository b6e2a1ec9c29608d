//! lca-dash library interface
//!
//! Terminal client for the LCA backend: CSV product uploads with job
//! tracking, material mapping review, product impact views and admin
//! session handling. Exposed as a library for integration testing.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ClientError, SessionError, WorkflowError};

use std::sync::Arc;

use lca_common::config::DashConfig;
use lca_common::{EventBus, JsonFileStore, MemoryStore};

use crate::models::{Session, UploadJob};
use crate::services::{
    ApiClient, HistoryStore, JobHistory, PollSettings, SessionService, SessionStore,
    UploadWorkflow,
};

/// Notification channel capacity
pub const EVENT_CAPACITY: usize = 256;

/// Application state shared by every command
#[derive(Clone)]
pub struct DashState {
    pub config: DashConfig,
    /// Notification bus
    pub events: EventBus,
    pub session: SessionStore,
    pub history: JobHistory,
    pub client: ApiClient,
}

impl DashState {
    /// Open with stores persisted under the configured data folder
    pub fn open(config: DashConfig) -> Result<Self, ClientError> {
        config.ensure_data_folder()?;
        let session: SessionStore = Arc::new(JsonFileStore::<Option<Session>>::open(
            config.session_path(),
        ));
        let history: HistoryStore =
            Arc::new(JsonFileStore::<Vec<UploadJob>>::open(config.history_path()));
        Self::with_stores(config, session, history)
    }

    /// In-memory stores, nothing touches disk
    pub fn in_memory(config: DashConfig) -> Result<Self, ClientError> {
        let session: SessionStore = Arc::new(MemoryStore::new(None));
        let history: HistoryStore = Arc::new(MemoryStore::new(Vec::new()));
        Self::with_stores(config, session, history)
    }

    pub fn with_stores(
        config: DashConfig,
        session: SessionStore,
        history: HistoryStore,
    ) -> Result<Self, ClientError> {
        let events = EventBus::new(EVENT_CAPACITY);
        let client = ApiClient::new(
            &config.api_base_url,
            config.request_timeout,
            session.clone(),
            events.clone(),
        )?;

        Ok(Self {
            config,
            events,
            session,
            history: JobHistory::new(history),
            client,
        })
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.config.poll_interval,
            max_attempts: self.config.max_poll_attempts,
        }
    }

    pub fn upload_workflow(&self) -> UploadWorkflow {
        UploadWorkflow::new(self.client.clone(), self.history.clone(), self.poll_settings())
    }

    pub fn session_service(&self) -> SessionService {
        SessionService::new(self.client.clone())
    }
}
