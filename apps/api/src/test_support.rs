//! In-memory doubles for the backend and the content store.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::attachments::reference::{AttachmentReference, ContentId, ContentUrls};
use crate::backend::{BackendError, JobBoardBackend, StatusTransition};
use crate::content_store::{ContentStore, ContentStoreError, FileHandle};
use crate::models::application::{ApplicationId, ApplicationStatus, JobApplication, NewApplication};
use crate::models::job::SavedJob;
use crate::models::profile::{AttachmentPatch, PersonalDetails, UserProfile};

pub const CONTENT_BASE: &str = "https://content.test";

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// HTTP client for talking to `serve_stub`; bypasses any proxy settings.
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn profile_for(email: &str) -> UserProfile {
    UserProfile {
        email: email.to_string(),
        details: PersonalDetails {
            full_name: "Grace Hopper".to_string(),
            phone: "555-0100".to_string(),
            education: "Yale PhD".to_string(),
            ..PersonalDetails::default()
        },
        ..UserProfile::default()
    }
}

pub fn pending_application(user_email: &str, job_id: &str) -> JobApplication {
    JobApplication {
        id: ApplicationId(String::new()),
        user_email: user_email.to_string(),
        job_id: job_id.to_string(),
        resume: AttachmentReference::from_stored(Some("507f1f77bcf86cd799439011")),
        cover_letter: AttachmentReference::Empty,
        applied_at: Utc::now(),
        status: ApplicationStatus::Pending,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content store
// ────────────────────────────────────────────────────────────────────────────

/// Counts uploads and mints sequential ids. Can fail every upload, or every
/// upload after the first `n`.
pub struct RecordingContentStore {
    urls: ContentUrls,
    succeed_first: Option<usize>,
    attempts: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
}

impl RecordingContentStore {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn failing() -> Self {
        Self::build(Some(0))
    }

    pub fn failing_after(successes: usize) -> Self {
        Self::build(Some(successes))
    }

    fn build(succeed_first: Option<usize>) -> Self {
        Self {
            urls: ContentUrls::new(CONTENT_BASE).expect("static base URL"),
            succeed_first,
            attempts: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    /// Successful uploads only.
    pub fn upload_count(&self) -> usize {
        self.uploaded.lock().unwrap().len()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for RecordingContentStore {
    async fn upload(&self, file: &FileHandle) -> Result<ContentId, ContentStoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.succeed_first.is_some_and(|limit| attempt >= limit) {
            return Err(ContentStoreError::Rejected {
                status: 503,
                message: "store offline".to_string(),
            });
        }
        let mut uploaded = self.uploaded.lock().unwrap();
        uploaded.push(file.file_name.clone());
        let id = format!("{:024x}", 0xabc000 + uploaded.len());
        Ok(ContentId::parse(&id).expect("24 hex digits"))
    }

    fn resolve_url(&self, reference: &AttachmentReference) -> Option<String> {
        self.urls.render(reference)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<String, UserProfile>,
    applications: HashMap<String, JobApplication>,
    saved: BTreeSet<(String, String)>,
    deadlines: HashMap<String, Option<DateTime<Utc>>>,
    next_id: u64,
    profile_updates: usize,
    transitions: usize,
    fail_profile_updates: bool,
    fail_saved_jobs: bool,
}

/// Behaves like the GraphQL backend: unique (user, job) applications,
/// compare-and-set status, idempotence signalled through errors.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn with_profile(profile: UserProfile) -> Self {
        let backend = Self::default();
        backend
            .state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.email.clone(), profile);
        backend
    }

    pub fn profile(&self, email: &str) -> Option<UserProfile> {
        self.state.lock().unwrap().profiles.get(email).cloned()
    }

    pub fn profile_update_count(&self) -> usize {
        self.state.lock().unwrap().profile_updates
    }

    pub fn application_count(&self) -> usize {
        self.state.lock().unwrap().applications.len()
    }

    pub fn transition_count(&self) -> usize {
        self.state.lock().unwrap().transitions
    }

    pub fn saved_job_count(&self) -> usize {
        self.state.lock().unwrap().saved.len()
    }

    pub fn status_of(&self, id: &ApplicationId) -> Option<ApplicationStatus> {
        self.state
            .lock()
            .unwrap()
            .applications
            .get(&id.0)
            .map(|a| a.status)
    }

    /// Stores an application under a fresh id and returns that id.
    pub fn insert_application(&self, mut application: JobApplication) -> ApplicationId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        application.id = ApplicationId(format!("app-{:04}", state.next_id));
        let id = application.id.clone();
        state.applications.insert(id.0.clone(), application);
        id
    }

    pub fn set_job_deadline(&self, job_id: &str, deadline: Option<DateTime<Utc>>) {
        self.state
            .lock()
            .unwrap()
            .deadlines
            .insert(job_id.to_string(), deadline);
    }

    pub fn fail_profile_updates(&self) {
        self.state.lock().unwrap().fail_profile_updates = true;
    }

    pub fn fail_saved_jobs(&self) {
        self.state.lock().unwrap().fail_saved_jobs = true;
    }
}

#[async_trait]
impl JobBoardBackend for MemoryBackend {
    async fn fetch_profile(&self, email: &str) -> Result<Option<UserProfile>, BackendError> {
        Ok(self.profile(email))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_profile_updates {
            return Err(BackendError::Transport("profile store offline".to_string()));
        }
        state.profile_updates += 1;
        state
            .profiles
            .insert(profile.email.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile_attachments(
        &self,
        email: &str,
        patch: &AttachmentPatch,
    ) -> Result<UserProfile, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_profile_updates {
            return Err(BackendError::Transport("profile store offline".to_string()));
        }
        let profile = state
            .profiles
            .get_mut(email)
            .ok_or_else(|| BackendError::NotFound(format!("profile {email}")))?;
        profile.resume = patch.resume.clone();
        profile.cover_letter = patch.cover_letter.clone();
        let updated = profile.clone();
        state.profile_updates += 1;
        Ok(updated)
    }

    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<JobApplication, BackendError> {
        {
            let state = self.state.lock().unwrap();
            let duplicate = state.applications.values().any(|a| {
                a.user_email == application.user_email && a.job_id == application.job_id
            });
            if duplicate {
                return Err(BackendError::Conflict("already applied".to_string()));
            }
        }
        let id = self.insert_application(JobApplication {
            id: ApplicationId(String::new()),
            user_email: application.user_email.clone(),
            job_id: application.job_id.clone(),
            resume: application.resume.clone(),
            cover_letter: application.cover_letter.clone(),
            applied_at: application.applied_at,
            status: application.status,
        });
        let state = self.state.lock().unwrap();
        Ok(state.applications[&id.0].clone())
    }

    async fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<JobApplication>, BackendError> {
        // Let concurrent callers interleave between read and write.
        tokio::task::yield_now().await;
        Ok(self.state.lock().unwrap().applications.get(&id.0).cloned())
    }

    async fn transition_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<StatusTransition, BackendError> {
        let mut state = self.state.lock().unwrap();
        let application = state
            .applications
            .get_mut(&id.0)
            .ok_or_else(|| BackendError::NotFound(format!("application {id}")))?;
        if application.status != expected {
            return Ok(StatusTransition::Refused {
                current: application.status,
            });
        }
        application.status = next;
        let updated = application.clone();
        state.transitions += 1;
        Ok(StatusTransition::Applied(updated))
    }

    async fn save_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_saved_jobs {
            return Err(BackendError::Transport("saved jobs offline".to_string()));
        }
        if state
            .saved
            .insert((user_email.to_string(), job_id.to_string()))
        {
            Ok(())
        } else {
            Err(BackendError::Conflict("already saved".to_string()))
        }
    }

    async fn delete_saved_job(&self, user_email: &str, job_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_saved_jobs {
            return Err(BackendError::Transport("saved jobs offline".to_string()));
        }
        if state
            .saved
            .remove(&(user_email.to_string(), job_id.to_string()))
        {
            Ok(())
        } else {
            Err(BackendError::NotFound(format!("saved job {job_id}")))
        }
    }

    async fn saved_jobs(&self, user_email: &str) -> Result<Vec<SavedJob>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail_saved_jobs {
            return Err(BackendError::Transport("saved jobs offline".to_string()));
        }
        Ok(state
            .saved
            .iter()
            .filter(|(email, _)| email == user_email)
            .map(|(email, job_id)| SavedJob {
                user_email: email.clone(),
                job_id: job_id.clone(),
                title: format!("Job {job_id}"),
                deadline: state.deadlines.get(job_id).copied().flatten(),
            })
            .collect())
    }
}
