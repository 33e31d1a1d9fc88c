use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ContentStore, ContentStoreError, FileHandle};
use crate::attachments::reference::{AttachmentReference, ContentId, ContentUrls};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
}

/// Uploads through the backend's `POST <base>/upload` endpoint.
#[derive(Clone)]
pub struct HttpContentStore {
    client: Client,
    urls: ContentUrls,
}

impl HttpContentStore {
    pub fn new(client: Client, urls: ContentUrls) -> Self {
        Self { client, urls }
    }
}

/// The `file` part of the upload form. A content type the browser sent but
/// that does not parse as a MIME type is dropped rather than failing the upload.
fn file_part(file: &FileHandle) -> Part {
    let part = || Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
    match &file.content_type {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|_| {
            debug!("Ignoring content type {content_type:?} for {}", file.file_name);
            part()
        }),
        None => part(),
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload(&self, file: &FileHandle) -> Result<ContentId, ContentStoreError> {
        let endpoint = self
            .urls
            .upload_endpoint()
            .ok_or_else(|| ContentStoreError::Storage("no upload endpoint".to_string()))?;

        let form = Form::new().part("file", file_part(file));

        debug!(
            "Uploading {} ({} bytes) to {endpoint}",
            file.file_name,
            file.bytes.len()
        );
        let response = self.client.post(&endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentStoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let id = ContentId::parse(&body.file_id)
            .ok_or_else(|| ContentStoreError::InvalidId(body.file_id.clone()))?;

        info!("Stored {} as content {id}", file.file_name);
        Ok(id)
    }

    fn resolve_url(&self, reference: &AttachmentReference) -> Option<String> {
        self.urls.render(reference)
    }
}
