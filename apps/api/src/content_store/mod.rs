//! Content store clients. Blobs leave this service only through these.
//!
//! `HttpContentStore` posts to the backend's upload endpoint; `S3ContentStore`
//! writes straight into a bucket and mints its own ids. Both hand back a
//! `ContentId`, never a path.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::attachments::reference::{file_extension, AttachmentReference, ContentId};

pub mod http;
pub mod s3;

pub use http::HttpContentStore;
pub use s3::S3ContentStore;

/// A file chosen by the user, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileHandle {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }
}

#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content store rejected upload (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("content store returned an invalid id: {0:?}")]
    InvalidId(String),

    #[error("object storage error: {0}")]
    Storage(String),
}

/// Blob storage seam. Implementations perform exactly one remote write per
/// `upload` call and never retry.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, file: &FileHandle) -> Result<ContentId, ContentStoreError>;

    /// Display URL for a stored reference. Not used by resolution.
    fn resolve_url(&self, reference: &AttachmentReference) -> Option<String>;
}
