use serde::{Deserialize, Serialize};

use crate::attachments::reference::AttachmentReference;

/// Free-form personal fields captured by the profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub education: String,
    pub experience: String,
    pub skills: Vec<String>,
}

/// A job seeker's profile, keyed by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub details: PersonalDetails,
    pub resume: AttachmentReference,
    pub cover_letter: AttachmentReference,
    pub profile_photo: AttachmentReference,
    pub self_intro_video: AttachmentReference,
}

/// The application-relevant subset of a profile's attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPatch {
    pub resume: AttachmentReference,
    pub cover_letter: AttachmentReference,
}
