//! Attachment references and their rendering to fetchable URLs.
//!
//! A stored attachment is one of three things: nothing, a content-store id
//! (24 hex characters minted at upload time), or a legacy filename kept from
//! before the content store existed. On the wire all three are a nullable
//! string; inside the service they are always the tagged enum.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// An id minted by the content store. Always 24 ASCII hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    pub const LEN: usize = 24;

    pub fn parse(value: &str) -> Option<Self> {
        is_content_id(value).then(|| Self(value.to_string()))
    }

    pub fn from_bytes(raw: [u8; 12]) -> Self {
        Self(hex::encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matches `^[a-fA-F0-9]{24}$`.
pub fn is_content_id(value: &str) -> bool {
    value.len() == ContentId::LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum AttachmentReference {
    #[default]
    Empty,
    ContentId(ContentId),
    LegacyPath(String),
}

impl AttachmentReference {
    /// Classifies a value as persisted by the backend.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Empty,
            Some(value) => match ContentId::parse(value) {
                Some(id) => Self::ContentId(id),
                None => Self::LegacyPath(value.to_string()),
            },
        }
    }

    pub fn as_stored(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::ContentId(id) => Some(id.as_str()),
            Self::LegacyPath(path) => Some(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Lower-cased trailing extension of a legacy path, if it has one.
    /// Content ids never report an extension.
    pub fn legacy_extension(&self) -> Option<String> {
        match self {
            Self::LegacyPath(path) => {
                let without_query = path.split(['?', '#']).next().unwrap_or_default();
                file_extension(basename(without_query))
            }
            _ => None,
        }
    }
}

impl From<Option<String>> for AttachmentReference {
    fn from(value: Option<String>) -> Self {
        Self::from_stored(value.as_deref())
    }
}

impl From<AttachmentReference> for Option<String> {
    fn from(value: AttachmentReference) -> Self {
        value.as_stored().map(str::to_string)
    }
}

impl From<ContentId> for AttachmentReference {
    fn from(value: ContentId) -> Self {
        Self::ContentId(value)
    }
}

/// Last path component, accepting both `/` and `\` separators.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lower-cased extension of a filename, `None` when it has none.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

#[derive(Debug, Error)]
pub enum ContentUrlError {
    #[error("invalid content base URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("content base URL cannot carry path segments: {0}")]
    NotHierarchical(String),
}

/// Renders references under the content store's public base URL.
#[derive(Debug, Clone)]
pub struct ContentUrls {
    base: Url,
}

impl ContentUrls {
    pub fn new(base: &str) -> Result<Self, ContentUrlError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(ContentUrlError::NotHierarchical(base.to_string()));
        }
        Ok(Self { base })
    }

    /// `Empty` renders to nothing; ids go under `/files/`; absolute URLs pass
    /// through; anything else is a legacy filename under `/uploads/`.
    pub fn render(&self, reference: &AttachmentReference) -> Option<String> {
        match reference {
            AttachmentReference::Empty => None,
            AttachmentReference::ContentId(id) => self.under(&["files", id.as_str()]),
            AttachmentReference::LegacyPath(path) => {
                if path.starts_with("http://") || path.starts_with("https://") {
                    Some(path.clone())
                } else {
                    self.under(&["uploads", basename(path)])
                }
            }
        }
    }

    /// Endpoint accepting multipart uploads.
    pub fn upload_endpoint(&self) -> Option<String> {
        self.under(&["upload"])
    }

    fn under(&self, segments: &[&str]) -> Option<String> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().ok()?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Some(url.to_string())
    }
}
