//! Turns "apply to job J" into a persisted `JobApplication`.
//!
//! Order of effects for one submission:
//! 1. validate resume + cover letter (no uploads yet)
//! 2. upload whichever new files were chosen
//! 3. sync newly uploaded references onto the profile
//! 4. create the application as `Pending`
//!
//! Slots that were kept or left empty on this application never touch the
//! profile; only an upload replaces what the profile holds.
//!
//! A failure at step 3 means no application is created. Uploads from a failed
//! attempt are left in the content store and are not reused on retry; the
//! retry reads the profile again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::applications::in_flight::InFlightRegistry;
use crate::attachments::reference::AttachmentReference;
use crate::attachments::resolver::{
    execute, plan, AttachmentRule, ResolveError, SlotKind, ValidationError,
};
use crate::backend::{BackendError, JobBoardBackend};
use crate::content_store::{ContentStore, ContentStoreError};

pub use crate::attachments::resolver::SlotSelection;
use crate::models::application::{ApplicationStatus, JobApplication, NewApplication};
use crate::models::profile::AttachmentPatch;

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub user_email: String,
    pub job_id: String,
    pub resume: SlotSelection,
    pub cover_letter: SlotSelection,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upload of {slot} failed: {source}")]
    UploadFailed {
        slot: SlotKind,
        #[source]
        source: ContentStoreError,
    },

    #[error("could not load profile: {0}")]
    ProfileLookupFailed(#[source] BackendError),

    #[error("could not update profile: {0}")]
    ProfilePersistFailed(#[source] BackendError),

    #[error("could not create application: {0}")]
    ApplicationCreateFailed(#[source] BackendError),

    #[error("a submission for {user_email} is already in progress")]
    InProgress { user_email: String },
}

impl From<ResolveError> for SubmissionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation(err) => SubmissionError::Validation(err),
            ResolveError::UploadFailed { slot, source } => {
                SubmissionError::UploadFailed { slot, source }
            }
        }
    }
}

impl SubmissionError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SubmissionError::InProgress { .. })
            || matches!(self, SubmissionError::ApplicationCreateFailed(err) if err.is_conflict())
    }
}

/// How long a successful submission blocks an identical re-submit locally.
/// After that the backend's uniqueness check is the only guard.
pub const RESUBMIT_WINDOW: Duration = Duration::from_secs(10 * 60);

type SubmissionKey = (String, String);

/// Recently created `(user, job)` pairs, forgotten after `RESUBMIT_WINDOW`.
#[derive(Debug, Default)]
struct RecentSubmissions {
    entries: Mutex<HashMap<SubmissionKey, Instant>>,
}

impl RecentSubmissions {
    fn contains(&self, key: &SubmissionKey) -> bool {
        let mut entries = self.lock();
        prune(&mut entries);
        entries.contains_key(key)
    }

    fn record(&self, key: SubmissionKey) {
        let mut entries = self.lock();
        prune(&mut entries);
        entries.insert(key, Instant::now());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    // Same recovery as `InFlightRegistry`: the map stays usable after a panic.
    fn lock(&self) -> MutexGuard<'_, HashMap<SubmissionKey, Instant>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn prune(entries: &mut HashMap<SubmissionKey, Instant>) {
    entries.retain(|_, created| created.elapsed() < RESUBMIT_WINDOW);
}

/// Orchestrates application submission for one process.
pub struct ApplicationSubmitter {
    backend: Arc<dyn JobBoardBackend>,
    store: Arc<dyn ContentStore>,
    in_flight: InFlightRegistry,
    recent: RecentSubmissions,
}

impl ApplicationSubmitter {
    pub fn new(
        backend: Arc<dyn JobBoardBackend>,
        store: Arc<dyn ContentStore>,
        in_flight: InFlightRegistry,
    ) -> Self {
        Self {
            backend,
            store,
            in_flight,
            recent: RecentSubmissions::default(),
        }
    }

    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<JobApplication, SubmissionError> {
        let SubmissionRequest {
            user_email,
            job_id,
            resume,
            cover_letter,
        } = request;

        let _guard = self
            .in_flight
            .try_acquire(format!("submission:{user_email}"))
            .ok_or_else(|| SubmissionError::InProgress {
                user_email: user_email.clone(),
            })?;

        let pair = (user_email.clone(), job_id.clone());
        if self.recent.contains(&pair) {
            warn!("Refusing duplicate application by {user_email} for job {job_id}");
            return Err(SubmissionError::ApplicationCreateFailed(
                BackendError::Conflict(format!("{user_email} already applied to {job_id}")),
            ));
        }

        let profile = self
            .backend
            .fetch_profile(&user_email)
            .await
            .map_err(SubmissionError::ProfileLookupFailed)?
            .unwrap_or_default();

        let resume_plan = plan(
            &AttachmentRule::new(SlotKind::Resume, true),
            resume.against(profile.resume.clone()),
        )?;
        let cover_letter_plan = plan(
            &AttachmentRule::new(SlotKind::CoverLetter, false),
            cover_letter.against(profile.cover_letter.clone()),
        )?;

        let resume_uploaded = resume_plan.needs_upload();
        let cover_letter_uploaded = cover_letter_plan.needs_upload();

        let resume = execute(resume_plan, self.store.as_ref()).await?;
        let cover_letter = execute(cover_letter_plan, self.store.as_ref()).await?;

        if resume_uploaded || cover_letter_uploaded {
            let patch = AttachmentPatch {
                resume: pick(resume_uploaded, &resume, &profile.resume),
                cover_letter: pick(cover_letter_uploaded, &cover_letter, &profile.cover_letter),
            };
            self.backend
                .update_profile_attachments(&user_email, &patch)
                .await
                .map_err(SubmissionError::ProfilePersistFailed)?;
            info!("Synced profile attachments for {user_email}");
        }

        let application = NewApplication {
            user_email: user_email.clone(),
            job_id: job_id.clone(),
            resume,
            cover_letter,
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
        };
        let created = self
            .backend
            .create_application(&application)
            .await
            .map_err(SubmissionError::ApplicationCreateFailed)?;

        self.recent.record(pair);
        info!(
            "Created application {} for {user_email} on job {job_id}",
            created.id
        );
        Ok(created)
    }

}

/// Profile value for a slot after this submission: the new upload, or what
/// the profile already held.
fn pick(
    uploaded: bool,
    resolved: &AttachmentReference,
    stored: &AttachmentReference,
) -> AttachmentReference {
    if uploaded {
        resolved.clone()
    } else {
        stored.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_store::FileHandle;
    use crate::models::profile::UserProfile;
    use crate::test_support::{profile_for, MemoryBackend, RecordingContentStore};

    const EMAIL: &str = "seeker@example.com";
    const STORED_ID: &str = "507f1f77bcf86cd799439011";
    const LETTER_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";

    fn submitter(
        backend: &Arc<MemoryBackend>,
        store: &Arc<RecordingContentStore>,
    ) -> ApplicationSubmitter {
        ApplicationSubmitter::new(backend.clone(), store.clone(), InFlightRegistry::new())
    }

    fn request(resume: SlotSelection) -> SubmissionRequest {
        SubmissionRequest {
            user_email: EMAIL.to_string(),
            job_id: "J1".to_string(),
            resume,
            cover_letter: SlotSelection::default(),
        }
    }

    #[tokio::test]
    async fn test_first_resume_is_uploaded_and_synced_to_profile() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());

        let application = submitter(&backend, &store)
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap();

        assert_eq!(store.upload_count(), 1);
        assert_eq!(backend.profile_update_count(), 1);
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert!(matches!(application.resume, AttachmentReference::ContentId(_)));

        let profile = backend.profile(EMAIL).unwrap();
        assert_eq!(profile.resume, application.resume);
        assert_eq!(backend.application_count(), 1);
    }

    #[tokio::test]
    async fn test_keeping_profile_resume_skips_upload_and_profile_update() {
        let mut profile = profile_for(EMAIL);
        profile.resume = AttachmentReference::from_stored(Some(STORED_ID));
        let backend = Arc::new(MemoryBackend::with_profile(profile.clone()));
        let store = Arc::new(RecordingContentStore::new());

        let application = submitter(&backend, &store)
            .submit(request(SlotSelection::keep()))
            .await
            .unwrap();

        assert_eq!(application.resume, profile.resume);
        assert_eq!(store.upload_count(), 0);
        assert_eq!(backend.profile_update_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_resume_is_rejected_before_anything_happens() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());

        let err = submitter(&backend, &store)
            .submit(request(SlotSelection::keep()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::MissingRequiredAttachment {
                slot: SlotKind::Resume
            })
        ));
        assert_eq!(backend.application_count(), 0);
        assert_eq!(backend.profile_update_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_cover_letter_blocks_resume_upload() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());
        let mut req = request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF")));
        req.cover_letter = SlotSelection::upload(FileHandle::new("letter.txt", "hi"));

        let err = submitter(&backend, &store).submit(req).await.unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::InvalidAttachmentType {
                slot: SlotKind::CoverLetter,
                ..
            })
        ));
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_submission_conflicts_and_creates_one_record() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());
        let submitter = submitter(&backend, &store);
        let req = request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF")));

        submitter.submit(req.clone()).await.unwrap();
        let err = submitter.submit(req).await.unwrap_err();

        assert!(matches!(err, SubmissionError::ApplicationCreateFailed(_)));
        assert!(err.is_conflict());
        assert_eq!(backend.application_count(), 1);
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_uniqueness_is_surfaced_across_sessions() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());
        let req = request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF")));

        submitter(&backend, &store).submit(req.clone()).await.unwrap();
        let err = submitter(&backend, &store).submit(req).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(backend.application_count(), 1);
    }

    #[tokio::test]
    async fn test_profile_persist_failure_prevents_application() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        backend.fail_profile_updates();
        let store = Arc::new(RecordingContentStore::new());

        let err = submitter(&backend, &store)
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::ProfilePersistFailed(_)));
        assert_eq!(backend.application_count(), 0);
        // The upload already happened and is not rolled back.
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile_cannot_be_synced() {
        let backend = Arc::new(MemoryBackend::default());
        let store = Arc::new(RecordingContentStore::new());

        let err = submitter(&backend, &store)
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::ProfilePersistFailed(BackendError::NotFound(_))
        ));
        assert_eq!(backend.application_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::failing());

        let err = submitter(&backend, &store)
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::UploadFailed {
                slot: SlotKind::Resume,
                ..
            }
        ));
        assert_eq!(backend.profile_update_count(), 0);
        assert_eq!(backend.application_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submission_for_same_user_is_refused() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());
        let registry = InFlightRegistry::new();
        let submitter =
            ApplicationSubmitter::new(backend.clone(), store.clone(), registry.clone());

        let _held = registry.try_acquire(format!("submission:{EMAIL}")).unwrap();
        let err = submitter
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::InProgress { .. }));
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_application_without_cover_letter_leaves_profile_letter_alone() {
        let mut profile = profile_for(EMAIL);
        profile.resume = AttachmentReference::from_stored(Some(STORED_ID));
        profile.cover_letter = AttachmentReference::from_stored(Some(LETTER_ID));
        let backend = Arc::new(MemoryBackend::with_profile(profile));
        let store = Arc::new(RecordingContentStore::new());

        let application = submitter(&backend, &store)
            .submit(request(SlotSelection::keep()))
            .await
            .unwrap();

        assert_eq!(application.cover_letter, AttachmentReference::Empty);
        assert_eq!(store.upload_count(), 0);
        assert_eq!(backend.profile_update_count(), 0);
        assert_eq!(
            backend.profile(EMAIL).unwrap().cover_letter,
            AttachmentReference::from_stored(Some(LETTER_ID))
        );
    }

    #[tokio::test]
    async fn test_new_resume_sync_keeps_profile_cover_letter() {
        let mut profile = profile_for(EMAIL);
        profile.cover_letter = AttachmentReference::from_stored(Some(LETTER_ID));
        let backend = Arc::new(MemoryBackend::with_profile(profile));
        let store = Arc::new(RecordingContentStore::new());

        let application = submitter(&backend, &store)
            .submit(request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF"))))
            .await
            .unwrap();

        let synced = backend.profile(EMAIL).unwrap();
        assert_eq!(backend.profile_update_count(), 1);
        assert_eq!(synced.resume, application.resume);
        assert_eq!(
            synced.cover_letter,
            AttachmentReference::from_stored(Some(LETTER_ID))
        );
        assert!(application.cover_letter.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_duplicate_check_expires() {
        let backend = Arc::new(MemoryBackend::with_profile(profile_for(EMAIL)));
        let store = Arc::new(RecordingContentStore::new());
        let submitter = submitter(&backend, &store);
        let req = request(SlotSelection::upload(FileHandle::new("cv.pdf", "%PDF")));

        submitter.submit(req.clone()).await.unwrap();
        assert_eq!(submitter.recent.len(), 1);

        tokio::time::advance(RESUBMIT_WINDOW + Duration::from_secs(1)).await;
        let err = submitter.submit(req).await.unwrap_err();

        // Past the window the request reaches the backend, which still refuses it.
        assert!(err.is_conflict());
        assert_eq!(store.upload_count(), 2);
        assert_eq!(backend.application_count(), 1);
        assert_eq!(submitter.recent.len(), 0);
    }

    #[tokio::test]
    async fn test_cover_letter_change_alone_updates_profile() {
        let mut profile: UserProfile = profile_for(EMAIL);
        profile.resume = AttachmentReference::from_stored(Some(STORED_ID));
        let backend = Arc::new(MemoryBackend::with_profile(profile));
        let store = Arc::new(RecordingContentStore::new());
        let mut req = request(SlotSelection::keep());
        req.cover_letter = SlotSelection::upload(FileHandle::new("letter.docx", "PK"));

        let application = submitter(&backend, &store).submit(req).await.unwrap();

        assert_eq!(store.upload_count(), 1);
        assert_eq!(backend.profile_update_count(), 1);
        assert_eq!(
            backend.profile(EMAIL).unwrap().cover_letter,
            application.cover_letter
        );
    }
}
