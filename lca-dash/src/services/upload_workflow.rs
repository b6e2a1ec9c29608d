//! CSV upload workflow state machine
//!
//! ```text
//! Idle → Uploading → ValidationError
//!                  → Polling ⟲ → Completed | Failed
//! any state → Idle (reset / cancel)
//! ```
//!
//! Upload and each poll are async requests; everything between them is a
//! synchronous transition on `UploadState`. Polling is bounded by
//! `max_attempts`, sleeps for the server-suggested delay when one is given,
//! and can be stopped through the workflow's cancellation token. Transport
//! errors while polling stop tracking without retry and leave the job in
//! `Polling` so the operator can resume.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use lca_common::{DashEvent, EventBus};
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, WorkflowError};
use crate::models::{
    JobStatus, JobStatusResponse, UploadJob, UploadOutcome, ValidationFailure,
};
use crate::services::{ApiClient, JobHistory, ReviewList};

/// Polling bounds
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Delay between polls when the server suggests none
    pub interval: Duration,
    /// Status requests allowed per tracking run
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 300,
        }
    }
}

/// Workflow state
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading {
        file_name: String,
    },
    ValidationError {
        file_name: String,
        failure: ValidationFailure,
    },
    Polling {
        job: UploadJob,
    },
    Completed {
        job: UploadJob,
    },
    Failed {
        job: UploadJob,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading { .. } => "uploading",
            UploadState::ValidationError { .. } => "validation error",
            UploadState::Polling { .. } => "polling",
            UploadState::Completed { .. } => "completed",
            UploadState::Failed { .. } => "failed",
        }
    }

    /// A request is outstanding or a job is being tracked
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Uploading { .. } | UploadState::Polling { .. })
    }

    pub fn job(&self) -> Option<&UploadJob> {
        match self {
            UploadState::Polling { job }
            | UploadState::Completed { job }
            | UploadState::Failed { job } => Some(job),
            _ => None,
        }
    }
}

/// Check a file selection: exactly one file, CSV by extension
pub fn validate_selection(files: &[PathBuf]) -> Result<&Path, WorkflowError> {
    let file = match files {
        [single] => single,
        [] => return Err(WorkflowError::InvalidFile("no file selected".to_string())),
        _ => {
            return Err(WorkflowError::InvalidFile(format!(
                "select exactly one file ({} given)",
                files.len()
            )))
        }
    };

    let is_csv = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(WorkflowError::InvalidFile(format!(
            "{} is not a CSV file",
            file.display()
        )));
    }

    Ok(file.as_path())
}

/// Drives one upload from file selection to a terminal job
pub struct UploadWorkflow {
    client: ApiClient,
    history: JobHistory,
    events: EventBus,
    poll: PollSettings,
    state: UploadState,
    cancel: CancellationToken,
}

impl UploadWorkflow {
    pub fn new(client: ApiClient, history: JobHistory, poll: PollSettings) -> Self {
        let events = client.events().clone();
        Self {
            client,
            history,
            events,
            poll,
            state: UploadState::Idle,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Token that stops an in-flight `track` when cancelled
    ///
    /// A fresh token is issued after every reset, so fetch it per run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Back to `Idle`, dropping any job or validation error
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.state = UploadState::Idle;
    }

    fn ensure_not_busy(&self, action: &'static str) -> Result<(), WorkflowError> {
        if self.state.is_busy() {
            return Err(WorkflowError::InvalidTransition {
                action,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    /// Upload the selected file
    ///
    /// Results in `ValidationError`, `Polling`, or `Idle` (legacy synchronous
    /// success). A transport failure returns the workflow to `Idle`.
    pub async fn submit(&mut self, files: &[PathBuf]) -> Result<&UploadState, WorkflowError> {
        self.ensure_not_busy("upload")?;
        let path = validate_selection(files)?.to_path_buf();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());

        let contents = tokio::fs::read(&path).await?;
        tracing::info!(file = %file_name, bytes = contents.len(), "Uploading CSV");
        self.state = UploadState::Uploading {
            file_name: file_name.clone(),
        };

        match self.client.upload_csv(&file_name, contents).await {
            Ok(outcome) => {
                self.apply_outcome(file_name, outcome);
                Ok(&self.state)
            }
            Err(e) => {
                tracing::error!(file = %file_name, error = %e, "Upload request failed");
                self.state = UploadState::Idle;
                Err(e.into())
            }
        }
    }

    /// Transition out of `Uploading` for a decoded upload response
    pub fn apply_outcome(&mut self, file_name: String, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Rejected(failure) => {
                tracing::warn!(
                    file = %file_name,
                    errors = failure.errors.len(),
                    "Upload failed validation"
                );
                self.events.emit_lossy(DashEvent::UploadValidationFailed {
                    file_name: file_name.clone(),
                    error_count: failure.errors.len(),
                    timestamp: Utc::now(),
                });
                self.state = UploadState::ValidationError { file_name, failure };
            }
            UploadOutcome::Queued { job_id } => {
                tracing::info!(job_id = %job_id, file = %file_name, "Upload queued");
                self.events.emit_lossy(DashEvent::UploadSubmitted {
                    job_id: job_id.clone(),
                    file_name: file_name.clone(),
                    timestamp: Utc::now(),
                });
                self.state = UploadState::Polling {
                    job: UploadJob::pending(job_id, Some(file_name)),
                };
            }
            UploadOutcome::Accepted { message } => {
                tracing::info!(file = %file_name, message = %message, "Upload accepted synchronously");
                self.events.emit_lossy(DashEvent::UploadAccepted {
                    file_name,
                    message,
                    timestamp: Utc::now(),
                });
                self.state = UploadState::Idle;
            }
        }
    }

    /// Start tracking an existing job id (e.g. after a restart)
    pub fn resume(&mut self, job_id: &str) -> Result<(), WorkflowError> {
        self.ensure_not_busy("resume tracking")?;
        let mut job = UploadJob::pending(job_id, None);
        if let Some(previous) = self.history.get(job_id) {
            job.file_name = previous.file_name;
            job.created_at = previous.created_at;
        }
        self.state = UploadState::Polling { job };
        Ok(())
    }

    /// Apply one poll response while `Polling`
    ///
    /// Terminal statuses move to `Completed` / `Failed`, record the job in
    /// history and emit the matching notification.
    pub fn apply_status(&mut self, response: &JobStatusResponse) -> Result<(), WorkflowError> {
        let job = match &mut self.state {
            UploadState::Polling { job } => job,
            other => {
                return Err(WorkflowError::InvalidTransition {
                    action: "apply job status",
                    state: other.name(),
                })
            }
        };

        job.apply_status(response);
        let job = job.clone();

        match job.status {
            JobStatus::Pending | JobStatus::Processing => {
                self.events.emit_lossy(DashEvent::JobProgressUpdated {
                    job_id: job.job_id.clone(),
                    percentage: job.progress.percentage(),
                    stage: job.progress.stage().map(str::to_string),
                    message: Some(job.message.clone()).filter(|m| !m.is_empty()),
                    timestamp: Utc::now(),
                });
            }
            JobStatus::Completed => {
                let summary = job.summary().cloned().unwrap_or_default();
                tracing::info!(
                    job_id = %job.job_id,
                    matched = summary.materials_matched,
                    unmatched = summary.materials_unmatched,
                    "Upload job completed"
                );
                self.remember(&job);
                self.events.emit_lossy(DashEvent::JobCompleted {
                    job_id: job.job_id.clone(),
                    materials_matched: summary.materials_matched,
                    materials_unmatched: summary.materials_unmatched,
                    timestamp: Utc::now(),
                });
                self.state = UploadState::Completed { job };
            }
            JobStatus::Failed => {
                tracing::warn!(
                    job_id = %job.job_id,
                    errors = job.errors.len(),
                    message = %job.message,
                    "Upload job failed"
                );
                self.remember(&job);
                self.events.emit_lossy(DashEvent::JobFailed {
                    job_id: job.job_id.clone(),
                    message: failure_message(&job),
                    timestamp: Utc::now(),
                });
                self.state = UploadState::Failed { job };
            }
        }

        Ok(())
    }

    /// History write failures are logged, never fatal
    fn remember(&self, job: &UploadJob) {
        if let Err(e) = self.history.record(job) {
            tracing::error!(job_id = %job.job_id, error = %e, "Failed to save upload history");
        }
    }

    /// Poll until the job is terminal, cancelled, or the attempt budget is spent
    pub async fn track(&mut self) -> Result<&UploadState, WorkflowError> {
        let job_id = match &self.state {
            UploadState::Polling { job } => job.job_id.clone(),
            other if other.job().is_some() => return Ok(&self.state),
            other => {
                return Err(WorkflowError::InvalidTransition {
                    action: "track",
                    state: other.name(),
                })
            }
        };
        let cancel = self.cancel.clone();

        for attempt in 1..=self.poll.max_attempts {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => None,
                response = self.client.job_status(&job_id) => Some(response),
            };

            let response = match fetched {
                None => return Err(self.cancelled(&job_id)),
                Some(Ok(response)) => response,
                Some(Err(e)) => return Err(self.tracking_failed(&job_id, e)),
            };

            tracing::debug!(
                job_id = %job_id,
                attempt,
                status = response.status.as_str(),
                "Job status received"
            );
            let delay = response
                .next_poll_ms
                .map(Duration::from_millis)
                .unwrap_or(self.poll.interval);
            self.apply_status(&response)?;

            if !matches!(self.state, UploadState::Polling { .. }) {
                return Ok(&self.state);
            }
            if attempt == self.poll.max_attempts {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancelled(&job_id)),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let attempts = self.poll.max_attempts;
        tracing::warn!(job_id = %job_id, attempts, "Giving up on job status");
        self.events.emit_lossy(DashEvent::TrackingError {
            job_id: job_id.clone(),
            message: format!("job still running after {} status checks", attempts),
            timestamp: Utc::now(),
        });
        Err(WorkflowError::PollLimit { job_id, attempts })
    }

    fn cancelled(&mut self, job_id: &str) -> WorkflowError {
        tracing::info!(job_id = %job_id, "Job tracking cancelled");
        self.events.emit_lossy(DashEvent::TrackingCancelled {
            job_id: job_id.to_string(),
            timestamp: Utc::now(),
        });
        self.reset();
        WorkflowError::Cancelled
    }

    fn tracking_failed(&self, job_id: &str, error: ClientError) -> WorkflowError {
        tracing::error!(job_id = %job_id, error = %error, "Job status request failed");
        self.events.emit_lossy(DashEvent::TrackingError {
            job_id: job_id.to_string(),
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        error.into()
    }

    /// Review list for a completed job's unmatched materials
    pub fn review_list(&self) -> Option<ReviewList> {
        match &self.state {
            UploadState::Completed { job } => Some(review_for(job)),
            _ => None,
        }
    }
}

/// Review list seeded from a finished job's result
pub fn review_for(job: &UploadJob) -> ReviewList {
    let materials = job
        .result
        .as_ref()
        .map(|r| r.materials_requiring_review.clone())
        .unwrap_or_default();
    ReviewList::new(materials)
}

fn failure_message(job: &UploadJob) -> String {
    if !job.message.is_empty() {
        job.message.clone()
    } else if let Some(first) = job.errors.first() {
        first.clone()
    } else {
        "processing failed".to_string()
    }
}
