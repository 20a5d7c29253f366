//! File upload API.

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    client::ChatClientInner,
    error::{Error, Result},
    models::AttachmentId,
};

/// Bucket used for message attachments.
pub const ATTACHMENTS_TAG: &str = "attachments";

/// API for the file server.
pub struct FileApi {
    client: Arc<ChatClientInner>,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: AttachmentId,
}

impl FileApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// Upload a message attachment.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<AttachmentId> {
        if bytes.is_empty() {
            return Err(Error::invalid(format!("{} is empty", filename)));
        }

        let size = bytes.len();
        let response: UploadResponse = self
            .client
            .authed_executor()?
            .upload(ATTACHMENTS_TAG, bytes, filename, content_type)
            .await?;

        log::debug!("Uploaded {} ({} bytes) as {}", filename, size, response.id);
        Ok(response.id)
    }
}
