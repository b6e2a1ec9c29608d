//! Recent upload jobs
//!
//! Finished jobs (completed or failed) are kept most-recent-first, one entry
//! per job id, at most [`MAX_HISTORY`] entries. The list survives restarts
//! through whichever `Store` backs it.

use std::sync::Arc;

use lca_common::{Result, Store};
use tokio::sync::watch;

use crate::models::UploadJob;

/// History cap
pub const MAX_HISTORY: usize = 10;

pub type HistoryStore = Arc<dyn Store<Vec<UploadJob>>>;

#[derive(Clone)]
pub struct JobHistory {
    store: HistoryStore,
}

impl JobHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// Insert a finished job at the front, replacing any entry with the same id
    ///
    /// Non-terminal jobs are ignored and `false` is returned.
    pub fn record(&self, job: &UploadJob) -> Result<bool> {
        if !job.is_terminal() {
            tracing::debug!(job_id = %job.job_id, "Skipping history for unfinished job");
            return Ok(false);
        }

        let mut entries = self.store.get();
        entries.retain(|existing| existing.job_id != job.job_id);
        entries.insert(0, job.clone());
        entries.truncate(MAX_HISTORY);
        self.store.set(entries)?;
        Ok(true)
    }

    /// Most recent first
    pub fn entries(&self) -> Vec<UploadJob> {
        self.store.get()
    }

    pub fn get(&self, job_id: &str) -> Option<UploadJob> {
        self.store.get().into_iter().find(|job| job.job_id == job_id)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.set(Vec::new())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<UploadJob>> {
        self.store.subscribe()
    }
}
