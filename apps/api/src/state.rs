use std::sync::Arc;

use crate::applications::decision::ApplicantDecisionMachine;
use crate::applications::in_flight::InFlightRegistry;
use crate::applications::submission::ApplicationSubmitter;
use crate::attachments::profile_set::RequiredFieldsValidator;
use crate::backend::JobBoardBackend;
use crate::content_store::ContentStore;
use crate::profiles::ProfileService;
use crate::saved_jobs::SavedJobRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn JobBoardBackend>,
    pub store: Arc<dyn ContentStore>,
    pub profiles: Arc<ProfileService>,
    pub submitter: Arc<ApplicationSubmitter>,
    pub decisions: Arc<ApplicantDecisionMachine>,
    pub saved_jobs: Arc<SavedJobRegistry>,
    /// Largest accepted file part, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wires every service onto one backend and content store. Submissions and
    /// decisions share a single in-flight registry.
    pub fn new(
        backend: Arc<dyn JobBoardBackend>,
        store: Arc<dyn ContentStore>,
        max_upload_bytes: usize,
    ) -> Self {
        let in_flight = InFlightRegistry::new();
        Self {
            profiles: Arc::new(ProfileService::new(
                backend.clone(),
                store.clone(),
                Arc::new(RequiredFieldsValidator),
            )),
            submitter: Arc::new(ApplicationSubmitter::new(
                backend.clone(),
                store.clone(),
                in_flight.clone(),
            )),
            decisions: Arc::new(ApplicantDecisionMachine::new(backend.clone(), in_flight)),
            saved_jobs: Arc::new(SavedJobRegistry::new(backend.clone())),
            backend,
            store,
            max_upload_bytes,
        }
    }
}
