use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{ContentStore, ContentStoreError, FileHandle};
use crate::attachments::reference::{AttachmentReference, ContentId, ContentUrls};

/// Writes blobs to `s3://<bucket>/files/<id>` and serves them from the
/// configured content base URL.
#[derive(Clone)]
pub struct S3ContentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    urls: ContentUrls,
}

impl S3ContentStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, urls: ContentUrls) -> Self {
        Self {
            client,
            bucket,
            urls,
        }
    }
}

/// 4 bytes of big-endian unix seconds followed by 8 random bytes, hex encoded.
pub fn mint_content_id() -> ContentId {
    let seconds = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
    let random = Uuid::new_v4();

    let mut raw = [0u8; 12];
    raw[..4].copy_from_slice(&seconds.to_be_bytes());
    raw[4..].copy_from_slice(&random.as_bytes()[..8]);

    ContentId::from_bytes(raw)
}

#[async_trait]
impl ContentStore for S3ContentStore {
    async fn upload(&self, file: &FileHandle) -> Result<ContentId, ContentStoreError> {
        let id = mint_content_id();
        let key = format!("files/{id}");
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.bytes.clone()))
            .content_type(content_type)
            .metadata("original-filename", &file.file_name)
            .send()
            .await
            .map_err(|e| ContentStoreError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {} to s3://{}/{}", file.file_name, self.bucket, key);
        Ok(id)
    }

    fn resolve_url(&self, reference: &AttachmentReference) -> Option<String> {
        self.urls.render(reference)
    }
}
