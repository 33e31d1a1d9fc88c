//! Persistence seam. The service owns no database; profiles, applications and
//! saved jobs live behind the job board's GraphQL API.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::application::{ApplicationId, ApplicationStatus, JobApplication, NewApplication};
use crate::models::job::SavedJob;
use crate::models::profile::{AttachmentPatch, UserProfile};

pub mod graphql;

pub use graphql::GraphqlBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend unavailable: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::Conflict(_))
    }
}

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    Applied(JobApplication),
    /// The stored status no longer matched the expected one.
    Refused { current: ApplicationStatus },
}

#[async_trait]
pub trait JobBoardBackend: Send + Sync {
    async fn fetch_profile(&self, email: &str) -> Result<Option<UserProfile>, BackendError>;

    /// Creates the profile on first save, replaces it afterwards.
    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, BackendError>;

    async fn update_profile_attachments(
        &self,
        email: &str,
        patch: &AttachmentPatch,
    ) -> Result<UserProfile, BackendError>;

    /// Must fail with `Conflict` when the (user, job) pair already applied.
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<JobApplication, BackendError>;

    async fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<JobApplication>, BackendError>;

    /// Compare-and-set on the stored status.
    async fn transition_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<StatusTransition, BackendError>;

    /// Returns `Conflict` when the job is already saved.
    async fn save_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError>;

    /// Returns `NotFound` when there is nothing to delete.
    async fn delete_saved_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError>;

    async fn saved_jobs(&self, user_email: &str) -> Result<Vec<SavedJob>, BackendError>;
}
