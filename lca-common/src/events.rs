//! Notification events for the LCA dashboard
//!
//! Every user-facing notification (the browser's toasts) is a `DashEvent`
//! broadcast on an `EventBus`. Front-ends subscribe and render them; the
//! workflows never print directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity used when rendering a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Dashboard event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashEvent {
    /// CSV accepted by the backend and queued as a job
    UploadSubmitted {
        job_id: String,
        file_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Upload rejected synchronously; no job was created
    UploadValidationFailed {
        file_name: String,
        error_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Legacy synchronous success (no job to track)
    UploadAccepted {
        file_name: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Poll response received for a running job
    JobProgressUpdated {
        job_id: String,
        percentage: f64,
        stage: Option<String>,
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Job reached Completed
    JobCompleted {
        job_id: String,
        materials_matched: u64,
        materials_unmatched: u64,
        timestamp: DateTime<Utc>,
    },

    /// Job reached Failed
    JobFailed {
        job_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Transport failure while polling; tracking stopped without retry
    TrackingError {
        job_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Polling stopped by the operator
    TrackingCancelled {
        job_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Mapping snapshot accepted by the backend
    MappingsConfirmed {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Mapping submission failed; local selection kept
    MappingConfirmFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A request came back 401; the session was cleared
    SessionExpired { timestamp: DateTime<Utc> },

    LoggedIn {
        email: String,
        timestamp: DateTime<Utc>,
    },

    LoggedOut { timestamp: DateTime<Utc> },

    ImpersonationStarted {
        email: String,
        impersonator: String,
        timestamp: DateTime<Utc>,
    },

    ImpersonationStopped {
        email: String,
        timestamp: DateTime<Utc>,
    },
}

impl DashEvent {
    /// Severity for display
    pub fn level(&self) -> NotificationLevel {
        match self {
            DashEvent::UploadSubmitted { .. }
            | DashEvent::JobProgressUpdated { .. }
            | DashEvent::TrackingCancelled { .. }
            | DashEvent::LoggedOut { .. }
            | DashEvent::ImpersonationStarted { .. }
            | DashEvent::ImpersonationStopped { .. } => NotificationLevel::Info,
            DashEvent::UploadAccepted { .. }
            | DashEvent::JobCompleted { .. }
            | DashEvent::MappingsConfirmed { .. }
            | DashEvent::LoggedIn { .. } => NotificationLevel::Success,
            DashEvent::SessionExpired { .. } => NotificationLevel::Warning,
            DashEvent::UploadValidationFailed { .. }
            | DashEvent::JobFailed { .. }
            | DashEvent::TrackingError { .. }
            | DashEvent::MappingConfirmFailed { .. } => NotificationLevel::Error,
        }
    }

    /// One-line human message
    pub fn message(&self) -> String {
        match self {
            DashEvent::UploadSubmitted { job_id, file_name, .. } => {
                format!("{} uploaded, processing as job {}", file_name, job_id)
            }
            DashEvent::UploadValidationFailed { file_name, error_count, .. } => {
                format!("{} failed validation ({} errors)", file_name, error_count)
            }
            DashEvent::UploadAccepted { file_name, message, .. } => {
                format!("{}: {}", file_name, message)
            }
            DashEvent::JobProgressUpdated { job_id, percentage, stage, message, .. } => {
                let detail = message.as_deref().or(stage.as_deref()).unwrap_or("processing");
                format!("Job {}: {:.0}% {}", job_id, percentage, detail)
            }
            DashEvent::JobCompleted { materials_matched, materials_unmatched, .. } => {
                format!(
                    "Upload processed: {} materials matched, {} need review",
                    materials_matched, materials_unmatched
                )
            }
            DashEvent::JobFailed { message, .. } => format!("Upload failed: {}", message),
            DashEvent::TrackingError { message, .. } => {
                format!("Error tracking upload: {}", message)
            }
            DashEvent::TrackingCancelled { job_id, .. } => {
                format!("Stopped tracking job {}", job_id)
            }
            DashEvent::MappingsConfirmed { count, .. } => {
                format!("{} material mappings confirmed", count)
            }
            DashEvent::MappingConfirmFailed { message, .. } => {
                format!("Failed to confirm mappings: {}", message)
            }
            DashEvent::SessionExpired { .. } => {
                "Session expired, please log in again".to_string()
            }
            DashEvent::LoggedIn { email, .. } => format!("Logged in as {}", email),
            DashEvent::LoggedOut { .. } => "Logged out".to_string(),
            DashEvent::ImpersonationStarted { email, impersonator, .. } => {
                format!("{} is now acting as {}", impersonator, email)
            }
            DashEvent::ImpersonationStopped { email, .. } => {
                format!("Returned to {}", email)
            }
        }
    }
}

/// Broadcast bus for dashboard notifications
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DashEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DashEvent) {
        let _ = self.tx.send(event);
    }
}
