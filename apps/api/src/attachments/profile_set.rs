use serde::Serialize;
use tracing::info;

use crate::attachments::reference::AttachmentReference;
use crate::attachments::resolver::{
    execute, plan, AttachmentChoice, AttachmentRule, ResolveError, SlotKind, ValidationError,
};
use crate::content_store::ContentStore;
use crate::models::profile::PersonalDetails;

/// Everything the profile form submits.
#[derive(Debug, Clone, Default)]
pub struct ProfileFormState {
    pub details: PersonalDetails,
    pub resume: AttachmentChoice,
    pub cover_letter: AttachmentChoice,
    pub profile_photo: AttachmentChoice,
    pub self_intro_video: AttachmentChoice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAttachments {
    pub resume: AttachmentReference,
    pub cover_letter: AttachmentReference,
    pub profile_photo: AttachmentReference,
    pub self_intro_video: AttachmentReference,
}

/// Checks the non-file profile fields before any attachment work starts.
pub trait ProfileFieldValidator: Send + Sync {
    fn validate(&self, details: &PersonalDetails) -> Result<(), ValidationError>;
}

/// Default validator: name, phone and education must be non-blank.
pub struct RequiredFieldsValidator;

impl ProfileFieldValidator for RequiredFieldsValidator {
    fn validate(&self, details: &PersonalDetails) -> Result<(), ValidationError> {
        let fields = [
            ("full_name", &details.full_name),
            ("phone", &details.phone),
            ("education", &details.education),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingRequiredField { field });
            }
        }
        Ok(())
    }
}

/// Resolves all four profile slots.
///
/// Field checks run first, then every slot is planned; only when all of them
/// validate are uploads performed, one slot at a time. Uploads that complete
/// before a later upload fails are not rolled back.
pub async fn resolve_all(
    form: ProfileFormState,
    validator: &dyn ProfileFieldValidator,
    store: &dyn ContentStore,
) -> Result<ResolvedAttachments, ResolveError> {
    validator.validate(&form.details)?;

    let ProfileFormState {
        resume,
        cover_letter,
        profile_photo,
        self_intro_video,
        ..
    } = form;

    let plans = [
        plan(&AttachmentRule::for_profile(SlotKind::Resume), resume)?,
        plan(&AttachmentRule::for_profile(SlotKind::CoverLetter), cover_letter)?,
        plan(&AttachmentRule::for_profile(SlotKind::ProfilePhoto), profile_photo)?,
        plan(
            &AttachmentRule::for_profile(SlotKind::SelfIntroVideo),
            self_intro_video,
        )?,
    ];

    let uploads = plans.iter().filter(|p| p.needs_upload()).count();
    if uploads > 0 {
        info!("Profile attachments validated, uploading {uploads} file(s)");
    }

    let [resume, cover_letter, profile_photo, self_intro_video] = plans;
    Ok(ResolvedAttachments {
        resume: execute(resume, store).await?,
        cover_letter: execute(cover_letter, store).await?,
        profile_photo: execute(profile_photo, store).await?,
        self_intro_video: execute(self_intro_video, store).await?,
    })
}
