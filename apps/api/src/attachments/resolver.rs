//! Decides which reference to persist for one attachment slot.
//!
//! Resolution happens in two steps so callers with several slots can validate
//! all of them before uploading anything:
//!
//! 1. `plan`: pure validation, yields a `ResolutionPlan`.
//! 2. `execute`: performs at most one upload for the plan.
//!
//! `resolve_attachment` chains both for the single-slot case.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::attachments::reference::AttachmentReference;
use crate::content_store::{ContentStore, ContentStoreError, FileHandle};

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Resume,
    CoverLetter,
    ProfilePhoto,
    SelfIntroVideo,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Resume,
        SlotKind::CoverLetter,
        SlotKind::ProfilePhoto,
        SlotKind::SelfIntroVideo,
    ];

    /// Form field name used by the UI for this slot.
    pub const fn field_name(self) -> &'static str {
        match self {
            SlotKind::Resume => "resume",
            SlotKind::CoverLetter => "cover_letter",
            SlotKind::ProfilePhoto => "profile_photo",
            SlotKind::SelfIntroVideo => "self_intro_video",
        }
    }

    pub fn from_field_name(name: &str) -> Option<SlotKind> {
        SlotKind::ALL.into_iter().find(|slot| slot.field_name() == name)
    }

    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            SlotKind::Resume | SlotKind::CoverLetter => DOCUMENT_EXTENSIONS,
            SlotKind::ProfilePhoto => IMAGE_EXTENSIONS,
            SlotKind::SelfIntroVideo => VIDEO_EXTENSIONS,
        }
    }

    /// Profile-level requiredness. Applications reuse the resume rule.
    pub const fn required_on_profile(self) -> bool {
        matches!(self, SlotKind::Resume | SlotKind::ProfilePhoto)
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Validation rules for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRule {
    pub slot: SlotKind,
    pub allowed_extensions: &'static [&'static str],
    pub required: bool,
}

impl AttachmentRule {
    pub const fn new(slot: SlotKind, required: bool) -> Self {
        Self {
            slot,
            allowed_extensions: slot.allowed_extensions(),
            required,
        }
    }

    pub const fn for_profile(slot: SlotKind) -> Self {
        Self::new(slot, slot.required_on_profile())
    }

    fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

/// What the user picked for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentChoice {
    pub existing: AttachmentReference,
    pub keep_existing: bool,
    pub new_file: Option<FileHandle>,
}

impl AttachmentChoice {
    pub fn keep(existing: AttachmentReference) -> Self {
        Self {
            existing,
            keep_existing: true,
            new_file: None,
        }
    }

    #[cfg(test)]
    pub fn replace(existing: AttachmentReference, file: FileHandle) -> Self {
        Self {
            existing,
            keep_existing: false,
            new_file: Some(file),
        }
    }
}

/// Keep-or-replace selection for one slot, before the stored reference is
/// known. Callers pair it with the profile's current value via `against`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSelection {
    pub keep_existing: bool,
    pub new_file: Option<FileHandle>,
}

impl SlotSelection {
    pub fn keep() -> Self {
        Self {
            keep_existing: true,
            new_file: None,
        }
    }

    pub fn upload(file: FileHandle) -> Self {
        Self {
            keep_existing: false,
            new_file: Some(file),
        }
    }

    pub fn against(self, existing: AttachmentReference) -> AttachmentChoice {
        AttachmentChoice {
            existing,
            keep_existing: self.keep_existing,
            new_file: self.new_file,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{slot} is required")]
    MissingRequiredAttachment { slot: SlotKind },

    #[error("{slot} must be one of [{}], got '{file_name}'", .allowed.join(", "))]
    InvalidAttachmentType {
        slot: SlotKind,
        file_name: String,
        allowed: Vec<&'static str>,
    },

    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },

    #[error("{slot} exceeds the {limit} byte upload limit")]
    AttachmentTooLarge { slot: SlotKind, limit: usize },
}

impl ValidationError {
    /// Name of the form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredAttachment { slot }
            | ValidationError::InvalidAttachmentType { slot, .. }
            | ValidationError::AttachmentTooLarge { slot, .. } => slot.field_name(),
            ValidationError::MissingRequiredField { field } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upload of {slot} failed: {source}")]
    UploadFailed {
        slot: SlotKind,
        #[source]
        source: ContentStoreError,
    },
}

/// Outcome of validating one slot; carries the file when an upload is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
    Keep(AttachmentReference),
    Upload { slot: SlotKind, file: FileHandle },
    Clear,
}

impl ResolutionPlan {
    pub fn needs_upload(&self) -> bool {
        matches!(self, ResolutionPlan::Upload { .. })
    }
}

/// Validates a choice against a rule without touching the content store.
pub fn plan(rule: &AttachmentRule, choice: AttachmentChoice) -> Result<ResolutionPlan, ValidationError> {
    let AttachmentChoice {
        existing,
        keep_existing,
        new_file,
    } = choice;

    if keep_existing && !existing.is_empty() {
        // Content ids were validated by the store at upload time.
        if let Some(extension) = existing.legacy_extension() {
            if !rule.allows(&extension) {
                return Err(invalid_type(rule, existing.as_stored().unwrap_or_default()));
            }
        }
        return Ok(ResolutionPlan::Keep(existing));
    }

    if let Some(file) = new_file {
        let valid = file.extension().is_some_and(|ext| rule.allows(&ext));
        if !valid {
            return Err(invalid_type(rule, &file.file_name));
        }
        return Ok(ResolutionPlan::Upload {
            slot: rule.slot,
            file,
        });
    }

    if rule.required {
        Err(ValidationError::MissingRequiredAttachment { slot: rule.slot })
    } else {
        Ok(ResolutionPlan::Clear)
    }
}

/// Carries out a plan: zero uploads for `Keep`/`Clear`, one for `Upload`.
pub async fn execute(
    plan: ResolutionPlan,
    store: &dyn ContentStore,
) -> Result<AttachmentReference, ResolveError> {
    match plan {
        ResolutionPlan::Keep(reference) => Ok(reference),
        ResolutionPlan::Clear => Ok(AttachmentReference::Empty),
        ResolutionPlan::Upload { slot, file } => {
            debug!("Uploading new {slot}: {}", file.file_name);
            let id = store
                .upload(&file)
                .await
                .map_err(|source| ResolveError::UploadFailed { slot, source })?;
            Ok(AttachmentReference::ContentId(id))
        }
    }
}

/// Single-slot resolution: validate, then upload if needed. The HTTP surface
/// always resolves several slots at once and goes through `plan`/`execute`.
#[allow(dead_code)]
pub async fn resolve_attachment(
    rule: &AttachmentRule,
    choice: AttachmentChoice,
    store: &dyn ContentStore,
) -> Result<AttachmentReference, ResolveError> {
    let plan = plan(rule, choice)?;
    execute(plan, store).await
}

fn invalid_type(rule: &AttachmentRule, file_name: &str) -> ValidationError {
    ValidationError::InvalidAttachmentType {
        slot: rule.slot,
        file_name: file_name.to_string(),
        allowed: rule.allowed_extensions.to_vec(),
    }
}
