//! CSV upload job model
//!
//! An `UploadJob` is created when the backend accepts a file and is mutated
//! only by status poll responses. `Completed` and `Failed` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::materials::MaterialRequiringReview;
use super::opt_id_string;

/// Server-side job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Job progress as sent by the backend
///
/// The wire value is either a bare percentage or an object carrying the
/// current stage; it is decoded once here and never re-inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobProgress {
    Simple(f64),
    Detailed {
        percentage: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl JobProgress {
    /// Percentage clamped to `[0, 100]`
    pub fn percentage(&self) -> f64 {
        let raw = match self {
            JobProgress::Simple(p) => *p,
            JobProgress::Detailed { percentage, .. } => *percentage,
        };
        if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub fn stage(&self) -> Option<&str> {
        match self {
            JobProgress::Simple(_) => None,
            JobProgress::Detailed { stage, .. } => stage.as_deref(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            JobProgress::Simple(_) => None,
            JobProgress::Detailed { message, .. } => message.as_deref(),
        }
    }
}

impl Default for JobProgress {
    fn default() -> Self {
        JobProgress::Simple(0.0)
    }
}

/// Aggregate counts for a processed upload, displayed verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_materials: u64,
    #[serde(default)]
    pub materials_matched: u64,
    #[serde(default)]
    pub materials_unmatched: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// Result attached to a completed job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    #[serde(flatten)]
    pub summary: UploadSummary,

    /// Materials the backend could not match with confidence
    #[serde(default)]
    pub materials_requiring_review: Vec<MaterialRequiringReview>,
}

/// Structured validation failure (synchronous rejection or failed job)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Decoded response of `POST /products/upload-csv`
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Rejected synchronously; no job exists
    Rejected(ValidationFailure),
    /// Accepted for asynchronous processing
    Queued { job_id: String },
    /// Legacy synchronous success
    Accepted { message: String },
}

/// Raw upload response; every shape the backend may send
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUploadResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawUploadResponse {
    /// Classify the response; `None` when it matches no known shape
    pub(crate) fn into_outcome(self) -> Option<UploadOutcome> {
        if !self.errors.is_empty() {
            return Some(UploadOutcome::Rejected(ValidationFailure {
                errors: self.errors,
                details: self.details,
                validation_rules: self.validation_rules,
                suggestions: self.suggestions,
            }));
        }
        if let Some(job_id) = self.job_id {
            return Some(UploadOutcome::Queued { job_id });
        }
        self.message.map(|message| UploadOutcome::Accepted { message })
    }
}

/// Response of the job status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Server-suggested delay before the next poll
    #[serde(default, alias = "retryAfter")]
    pub next_poll_ms: Option<u64>,
}

/// Tracked upload job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub job_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UploadJob {
    /// Initial record created when the backend hands out a job id
    pub fn pending(job_id: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            job_id: job_id.into(),
            file_name,
            status: JobStatus::Pending,
            progress: JobProgress::Simple(0.0),
            message: String::from("Upload queued"),
            result: None,
            errors: Vec::new(),
            validation_rules: Vec::new(),
            suggestions: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Overwrite the mutable fields from a poll response
    ///
    /// Fields the response omits keep their previous value, except that a
    /// terminal response replaces errors and result wholesale.
    pub fn apply_status(&mut self, response: &JobStatusResponse) {
        self.status = response.status;
        if let Some(progress) = &response.progress {
            self.progress = progress.clone();
        }
        if let Some(message) = &response.message {
            self.message = message.clone();
        } else if let Some(message) = response.progress.as_ref().and_then(|p| p.message()) {
            self.message = message.to_string();
        }
        if response.status.is_terminal() {
            self.result = response.result.clone();
            self.errors = response.errors.clone();
            self.validation_rules = response.validation_rules.clone();
            self.suggestions = response.suggestions.clone();
            if response.status == JobStatus::Completed && response.progress.is_none() {
                self.progress = JobProgress::Simple(100.0);
            }
        }
        self.updated_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Counts shown after completion
    pub fn summary(&self) -> Option<&UploadSummary> {
        self.result.as_ref().map(|r| &r.summary)
    }
}
