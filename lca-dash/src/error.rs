//! Error types for lca-dash
//!
//! Mirrors the three user-facing failure categories:
//! - validation failures are data (`UploadOutcome::Rejected`, failed jobs),
//!   not errors
//! - transport failures surface as `ClientError::Network` / `Parse`
//! - a 401 anywhere surfaces as `ClientError::Unauthorized` after the
//!   session has been cleared

use thiserror::Error;

/// Backend API client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered 401; the local session has been cleared
    #[error("Not authenticated")]
    Unauthorized,

    /// Requested resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// lca-common error (stores, file I/O)
    #[error("Common error: {0}")]
    Common(#[from] lca_common::Error),
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Common(lca_common::Error::Io(err))
    }
}

/// Upload and review workflow errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// File selection rejected before any request
    #[error("Invalid file selection: {0}")]
    InvalidFile(String),

    /// Operation not allowed in the current state
    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    /// Confirmation attempted with no selected mappings
    #[error("No material mappings selected")]
    NothingSelected,

    /// Material id not present in the review list
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    /// Suggestion index out of range for a material
    #[error("Material {material_id} has no suggestion #{index}")]
    UnknownSuggestion { material_id: String, index: usize },

    /// Alternatives search returned no activity with this uuid
    #[error("No alternative {activity_uuid} found for material {material_id}")]
    UnknownAlternative {
        material_id: String,
        activity_uuid: String,
    },

    /// Polling stopped by cancellation
    #[error("Tracking cancelled")]
    Cancelled,

    /// Job still running after the configured number of polls
    #[error("Job {job_id} still running after {attempts} status checks")]
    PollLimit { job_id: String, attempts: u32 },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        WorkflowError::Client(ClientError::from(err))
    }
}

/// Session service errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Only administrators can impersonate users")]
    NotAdmin,

    #[error("Already impersonating {0}; stop first")]
    AlreadyImpersonating(String),

    #[error("Not impersonating anyone")]
    NotImpersonating,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<lca_common::Error> for SessionError {
    fn from(err: lca_common::Error) -> Self {
        SessionError::Client(ClientError::Common(err))
    }
}
