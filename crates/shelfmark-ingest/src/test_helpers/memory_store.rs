//! In-memory attachment store

use async_trait::async_trait;
use bytes::Bytes;
use shelfmark_core::{
    AttachmentStore, ContentFingerprint, NewAttachment, UploadAuthorization, UploadError,
    UploadTarget,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Handshake step the store should fail at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    Register,
    Authorize,
    Transfer,
    Confirm,
}

/// A transfer as received by the store.
#[derive(Debug, Clone)]
pub struct RecordedTransfer {
    pub upload_key: String,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Default)]
struct StoreState {
    attachments: HashMap<String, NewAttachment>,
    stored_hashes: HashSet<String>,
    pending: HashMap<String, String>,
    transfers: Vec<RecordedTransfer>,
    authorize_calls: usize,
    confirm_calls: usize,
}

/// Attachment store keeping records and content hashes in memory.
#[derive(Clone, Default)]
pub struct InMemoryAttachmentStore {
    state: Arc<Mutex<StoreState>>,
    failure: Option<StoreFailure>,
    prefix: String,
    suffix: String,
    target_content_type: Option<String>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, failure: StoreFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Framing bytes handed out with each upload target.
    pub fn with_frame(mut self, prefix: &str, suffix: &str) -> Self {
        self.prefix = prefix.to_string();
        self.suffix = suffix.to_string();
        self
    }

    pub fn with_target_content_type(mut self, content_type: &str) -> Self {
        self.target_content_type = Some(content_type.to_string());
        self
    }

    pub fn register_count(&self) -> usize {
        self.state.lock().unwrap().attachments.len()
    }

    pub fn authorize_count(&self) -> usize {
        self.state.lock().unwrap().authorize_calls
    }

    pub fn confirm_count(&self) -> usize {
        self.state.lock().unwrap().confirm_calls
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn attachment(&self, key: &str) -> Option<NewAttachment> {
        self.state.lock().unwrap().attachments.get(key).cloned()
    }

    fn fails_at(&self, step: StoreFailure) -> bool {
        self.failure == Some(step)
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn register_attachment(&self, attachment: &NewAttachment) -> Result<String, UploadError> {
        if self.fails_at(StoreFailure::Register) {
            return Err(UploadError::RegisterFailed(
                r#"{"0":{"code":400,"message":"parentItem not found"}}"#.to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        let key = format!("ATTACH{:02}", state.attachments.len() + 1);
        state.attachments.insert(key.clone(), attachment.clone());
        Ok(key)
    }

    async fn authorize_upload(
        &self,
        attachment_key: &str,
        _filename: &str,
        fingerprint: &ContentFingerprint,
    ) -> Result<UploadAuthorization, UploadError> {
        let mut state = self.state.lock().unwrap();
        state.authorize_calls += 1;
        if self.fails_at(StoreFailure::Authorize) {
            return Err(UploadError::AuthFailed("HTTP 403: File editing denied".to_string()));
        }
        if state.stored_hashes.contains(&fingerprint.md5) {
            return Ok(UploadAuthorization::Exists);
        }

        let upload_key = format!("upload-{}", attachment_key);
        state
            .pending
            .insert(upload_key.clone(), fingerprint.md5.clone());
        Ok(UploadAuthorization::Upload(UploadTarget {
            url: "memory://uploads".to_string(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            upload_key,
            content_type: self.target_content_type.clone(),
        }))
    }

    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), UploadError> {
        if self.fails_at(StoreFailure::Transfer) {
            return Err(UploadError::TransferFailed("HTTP 500".to_string()));
        }
        self.state.lock().unwrap().transfers.push(RecordedTransfer {
            upload_key: target.upload_key.clone(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }

    async fn confirm_upload(&self, _attachment_key: &str, upload_key: &str) -> Result<(), UploadError> {
        let mut state = self.state.lock().unwrap();
        state.confirm_calls += 1;
        if self.fails_at(StoreFailure::Confirm) {
            return Err(UploadError::ConfirmFailed("HTTP 412".to_string()));
        }
        if let Some(md5) = state.pending.remove(upload_key) {
            state.stored_hashes.insert(md5);
        }
        Ok(())
    }
}
