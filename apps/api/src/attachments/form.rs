//! Reads the multipart bodies posted by the profile and application forms.
//!
//! Text parts are collected by name. File parts are accepted only under a
//! slot's field name (`resume`, `cover_letter`, ...); a part with an empty
//! filename or an empty body means "no file chosen" and is dropped.

use std::collections::HashMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::BytesMut;
use thiserror::Error;
use tracing::debug;

use crate::attachments::resolver::{SlotKind, SlotSelection, ValidationError};
use crate::content_store::FileHandle;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("malformed form data: {0}")]
    Malformed(#[from] MultipartError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    text: HashMap<String, String>,
    files: HashMap<SlotKind, FileHandle>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart, max_bytes: usize) -> Result<Self, FormError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match (field.file_name().map(str::to_string), SlotKind::from_field_name(&name)) {
                (Some(file_name), Some(slot)) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = read_limited(field, slot, max_bytes).await?;
                    form.insert_file(slot, file_name, content_type, bytes.freeze());
                }
                (Some(file_name), None) => {
                    debug!("Ignoring file part '{name}' ({file_name})");
                }
                (None, _) => {
                    let value = field.text().await?;
                    form.text.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    fn insert_file(
        &mut self,
        slot: SlotKind,
        file_name: String,
        content_type: Option<String>,
        bytes: bytes::Bytes,
    ) {
        if file_name.trim().is_empty() || bytes.is_empty() {
            return;
        }
        let mut file = FileHandle::new(file_name, bytes);
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        self.files.insert(slot, file);
    }

    /// Trimmed text value; blank values read as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn text_or_default(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// The `keep_<slot>` checkbox.
    pub fn keeps(&self, slot: SlotKind) -> bool {
        self.text(&format!("keep_{}", slot.field_name()))
            .is_some_and(parse_flag)
    }

    pub fn require(&self, field: &'static str) -> Result<String, ValidationError> {
        self.text(field)
            .map(str::to_string)
            .ok_or(ValidationError::MissingRequiredField { field })
    }

    pub fn take_file(&mut self, slot: SlotKind) -> Option<FileHandle> {
        self.files.remove(&slot)
    }

    /// Keep flag and chosen file for `slot`, removing the file from the form.
    pub fn take_selection(&mut self, slot: SlotKind) -> SlotSelection {
        SlotSelection {
            keep_existing: self.keeps(slot),
            new_file: self.take_file(slot),
        }
    }
}

/// HTML checkboxes post `on`; API clients tend to send `true` or `1`.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

async fn read_limited(
    mut field: Field<'_>,
    slot: SlotKind,
    limit: usize,
) -> Result<BytesMut, FormError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(ValidationError::AttachmentTooLarge { slot, limit }.into());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
