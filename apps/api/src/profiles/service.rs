use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::attachments::profile_set::{resolve_all, ProfileFieldValidator, ProfileFormState};
use crate::attachments::resolver::{ResolveError, SlotSelection, ValidationError};
use crate::backend::{BackendError, JobBoardBackend};
use crate::content_store::ContentStore;
use crate::models::profile::{PersonalDetails, UserProfile};

/// A profile form submission.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: String,
    pub details: PersonalDetails,
    pub resume: SlotSelection,
    pub cover_letter: SlotSelection,
    pub profile_photo: SlotSelection,
    pub self_intro_video: SlotSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentUrls {
    pub resume: Option<String>,
    pub cover_letter: Option<String>,
    pub profile_photo: Option<String>,
    pub self_intro_video: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub profile: UserProfile,
    pub urls: AttachmentUrls,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("profile for {0} not found")]
    NotFound(String),

    #[error("could not load profile: {0}")]
    LookupFailed(#[source] BackendError),

    #[error("could not save profile: {0}")]
    PersistFailed(#[source] BackendError),
}

impl From<ValidationError> for ProfileError {
    fn from(err: ValidationError) -> Self {
        ProfileError::Resolve(err.into())
    }
}

pub struct ProfileService {
    backend: Arc<dyn JobBoardBackend>,
    store: Arc<dyn ContentStore>,
    validator: Arc<dyn ProfileFieldValidator>,
}

impl ProfileService {
    pub fn new(
        backend: Arc<dyn JobBoardBackend>,
        store: Arc<dyn ContentStore>,
        validator: Arc<dyn ProfileFieldValidator>,
    ) -> Self {
        Self {
            backend,
            store,
            validator,
        }
    }

    pub async fn view(&self, email: &str) -> Result<ProfileView, ProfileError> {
        let profile = self
            .backend
            .fetch_profile(email)
            .await
            .map_err(ProfileError::LookupFailed)?
            .ok_or_else(|| ProfileError::NotFound(email.to_string()))?;
        let urls = AttachmentUrls {
            resume: self.store.resolve_url(&profile.resume),
            cover_letter: self.store.resolve_url(&profile.cover_letter),
            profile_photo: self.store.resolve_url(&profile.profile_photo),
            self_intro_video: self.store.resolve_url(&profile.self_intro_video),
        };
        Ok(ProfileView { profile, urls })
    }

    /// Resolves all four attachments against the stored profile, then writes
    /// the whole profile back. Nothing is persisted when a slot fails.
    pub async fn save(&self, update: ProfileUpdate) -> Result<UserProfile, ProfileError> {
        let ProfileUpdate {
            email,
            details,
            resume,
            cover_letter,
            profile_photo,
            self_intro_video,
        } = update;
        if email.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField { field: "email" }.into());
        }

        let stored = self
            .backend
            .fetch_profile(&email)
            .await
            .map_err(ProfileError::LookupFailed)?
            .unwrap_or_default();

        let form = ProfileFormState {
            details: details.clone(),
            resume: resume.against(stored.resume),
            cover_letter: cover_letter.against(stored.cover_letter),
            profile_photo: profile_photo.against(stored.profile_photo),
            self_intro_video: self_intro_video.against(stored.self_intro_video),
        };
        let resolved = resolve_all(form, self.validator.as_ref(), self.store.as_ref()).await?;

        let profile = UserProfile {
            email,
            details,
            resume: resolved.resume,
            cover_letter: resolved.cover_letter,
            profile_photo: resolved.profile_photo,
            self_intro_video: resolved.self_intro_video,
        };
        let saved = self
            .backend
            .save_profile(&profile)
            .await
            .map_err(ProfileError::PersistFailed)?;
        info!("Saved profile for {}", saved.email);
        Ok(saved)
    }
}
