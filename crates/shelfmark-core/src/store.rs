//! Attachment store seam
//!
//! The upload handshake talks to the remote library through this trait. The
//! Zotero API client implements it; tests swap in an in-memory store.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::error::UploadError;
use crate::models::{ContentFingerprint, UploadAuthorization, UploadTarget};

/// Attachment record declared in the register step.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub parent_key: String,
    pub filename: String,
    pub content_type: String,
    pub fingerprint: ContentFingerprint,
}

impl NewAttachment {
    /// Item template for an `imported_file` attachment under `parent_key`.
    pub fn to_template(&self) -> Value {
        json!({
            "itemType": "attachment",
            "parentItem": self.parent_key,
            "linkMode": "imported_file",
            "title": self.filename,
            "contentType": self.content_type,
            "filename": self.filename,
            "md5": self.fingerprint.md5,
            "mtime": self.fingerprint.mtime,
        })
    }
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Create the attachment record and return its key.
    async fn register_attachment(&self, attachment: &NewAttachment)
        -> Result<String, UploadError>;

    /// Ask for an upload slot, only if no file is stored for the attachment yet.
    async fn authorize_upload(
        &self,
        attachment_key: &str,
        filename: &str,
        fingerprint: &ContentFingerprint,
    ) -> Result<UploadAuthorization, UploadError>;

    /// Send the already-framed body to the storage target as `content_type`.
    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), UploadError>;

    /// Mark the upload identified by `upload_key` as complete.
    async fn confirm_upload(&self, attachment_key: &str, upload_key: &str)
        -> Result<(), UploadError>;
}
