//! Services layer: backend client and the workflows built on it

pub mod api_client;
pub mod impacts;
pub mod job_history;
pub mod review_list;
pub mod session;
pub mod upload_workflow;

pub use api_client::{ApiClient, ConfirmResponse, SessionStore};
pub use impacts::{aggregate_impacts, ImpactBreakdown, ImpactContribution, ImpactRow};
pub use job_history::{HistoryStore, JobHistory, MAX_HISTORY};
pub use review_list::{ReviewCounts, ReviewFilter, ReviewList, SelectedMappings};
pub use session::SessionService;
pub use upload_workflow::{validate_selection, PollSettings, UploadState, UploadWorkflow};
