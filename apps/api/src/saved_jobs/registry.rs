use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{BackendError, JobBoardBackend};
use crate::models::job::SavedJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckKind {
    Saved,
    AlreadySaved,
    Removed,
    AlreadyAbsent,
}

/// Acknowledgement for save/remove. Repeats are acknowledged, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub user_email: String,
    pub job_id: String,
    pub outcome: AckKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedJobView {
    #[serde(flatten)]
    pub job: SavedJob,
    /// `false` once the deadline has passed. The entry is kept until the
    /// user removes it.
    pub actionable: bool,
}

#[derive(Debug, Error)]
pub enum SavedJobError {
    #[error("user email and job id are required")]
    MissingKey,

    #[error("saved jobs unavailable: {0}")]
    Backend(#[from] BackendError),
}

pub struct SavedJobRegistry {
    backend: Arc<dyn JobBoardBackend>,
}

impl SavedJobRegistry {
    pub fn new(backend: Arc<dyn JobBoardBackend>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, user_email: &str, job_id: &str) -> Result<Ack, SavedJobError> {
        require_key(user_email, job_id)?;
        let outcome = match self.backend.save_job(user_email, job_id).await {
            Ok(()) => AckKind::Saved,
            Err(BackendError::Conflict(_)) => AckKind::AlreadySaved,
            Err(err) => return Err(err.into()),
        };
        info!("Saved job {job_id} for {user_email}: {outcome:?}");
        Ok(ack(user_email, job_id, outcome))
    }

    pub async fn remove(&self, user_email: &str, job_id: &str) -> Result<Ack, SavedJobError> {
        require_key(user_email, job_id)?;
        let outcome = match self.backend.delete_saved_job(user_email, job_id).await {
            Ok(()) => AckKind::Removed,
            Err(BackendError::NotFound(_)) => AckKind::AlreadyAbsent,
            Err(err) => return Err(err.into()),
        };
        info!("Removed saved job {job_id} for {user_email}: {outcome:?}");
        Ok(ack(user_email, job_id, outcome))
    }

    pub async fn list(
        &self,
        user_email: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SavedJobView>, SavedJobError> {
        let jobs = self.backend.saved_jobs(user_email).await?;
        debug!("{} saved job(s) for {user_email}", jobs.len());
        Ok(jobs
            .into_iter()
            .map(|job| SavedJobView {
                actionable: job.is_open_at(now),
                job,
            })
            .collect())
    }
}

fn require_key(user_email: &str, job_id: &str) -> Result<(), SavedJobError> {
    if user_email.trim().is_empty() || job_id.trim().is_empty() {
        return Err(SavedJobError::MissingKey);
    }
    Ok(())
}

fn ack(user_email: &str, job_id: &str, outcome: AckKind) -> Ack {
    Ack {
        user_email: user_email.to_string(),
        job_id: job_id.to_string(),
        outcome,
    }
}
