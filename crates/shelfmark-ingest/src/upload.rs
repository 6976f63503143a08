//! Attachment upload handshake
//!
//! Drives an [`AttachmentStore`] through register, authorize, transfer and
//! confirm. Once the attachment record exists the key is never lost: every
//! later failure is reported alongside it.

use bytes::Bytes;
use shelfmark_core::{
    AttachmentStore, ContentFingerprint, FetchedContent, NewAttachment, UploadAuthorization,
    UploadError, UploadOutcome, UploadSession,
};
use std::fmt;

/// Handshake step reached, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Registered,
    Authorized,
    Exists,
    Transferred,
    Confirmed,
    AuthFailed,
    ConfirmFailed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::Registered => "registered",
            UploadState::Authorized => "authorized",
            UploadState::Exists => "exists",
            UploadState::Transferred => "transferred",
            UploadState::Confirmed => "confirmed",
            UploadState::AuthFailed => "auth_failed",
            UploadState::ConfirmFailed => "confirm_failed",
        };
        write!(f, "{}", name)
    }
}

/// A handshake that stopped with an error.
#[derive(Debug, Clone)]
pub struct UploadFailure {
    /// Set when the attachment record was created before the failing step.
    pub attachment_key: Option<String>,
    pub error: UploadError,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for UploadFailure {}

pub struct UploadProtocol<'a> {
    store: &'a dyn AttachmentStore,
}

impl<'a> UploadProtocol<'a> {
    pub fn new(store: &'a dyn AttachmentStore) -> Self {
        Self { store }
    }

    /// Attach `content` under `parent_key`.
    ///
    /// Authorization refusal yields [`UploadOutcome::CreatedOnly`] and a failed
    /// confirm yields [`UploadOutcome::Uploaded`] with a warning; only register
    /// and transfer failures are errors.
    pub async fn run(
        &self,
        parent_key: &str,
        content: &FetchedContent,
        fingerprint: ContentFingerprint,
    ) -> Result<UploadOutcome, UploadFailure> {
        let attachment = NewAttachment {
            parent_key: parent_key.to_string(),
            filename: content.filename.clone(),
            content_type: content.content_type.clone(),
            fingerprint: fingerprint.clone(),
        };

        let attachment_key = self
            .store
            .register_attachment(&attachment)
            .await
            .map_err(|error| UploadFailure {
                attachment_key: None,
                error,
            })?;

        let session = UploadSession::new(attachment_key, fingerprint);
        tracing::debug!(
            state = %UploadState::Registered,
            attachment_key = %session.attachment_key,
            parent_key = %parent_key,
            "Attachment record created"
        );

        let authorization = match self
            .store
            .authorize_upload(
                &session.attachment_key,
                &content.filename,
                &session.fingerprint,
            )
            .await
        {
            Ok(authorization) => authorization,
            Err(error) => {
                tracing::warn!(
                    state = %UploadState::AuthFailed,
                    attachment_key = %session.attachment_key,
                    error = %error,
                    "Upload authorization refused, keeping record without file"
                );
                return Ok(UploadOutcome::CreatedOnly {
                    attachment_key: session.attachment_key,
                    reason: error.to_string(),
                });
            }
        };

        let target = match authorization {
            UploadAuthorization::Exists => {
                tracing::debug!(
                    state = %UploadState::Exists,
                    attachment_key = %session.attachment_key,
                    md5 = %session.fingerprint.md5,
                    "Content already stored"
                );
                return Ok(UploadOutcome::Exists {
                    attachment_key: session.attachment_key,
                });
            }
            UploadAuthorization::Upload(target) => target,
        };
        tracing::debug!(
            state = %UploadState::Authorized,
            attachment_key = %session.attachment_key,
            upload_key = %target.upload_key,
            "Upload authorized"
        );

        let content_type = target
            .content_type
            .clone()
            .unwrap_or_else(|| content.content_type.clone());
        let body = Bytes::from(target.frame(&content.bytes));

        if let Err(error) = self.store.transfer(&target, &content_type, body).await {
            return Err(UploadFailure {
                attachment_key: Some(session.attachment_key),
                error,
            });
        }
        tracing::debug!(
            state = %UploadState::Transferred,
            attachment_key = %session.attachment_key,
            size_bytes = content.len(),
            "Content transferred"
        );

        let confirm_warning = match self
            .store
            .confirm_upload(&session.attachment_key, &target.upload_key)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    state = %UploadState::Confirmed,
                    attachment_key = %session.attachment_key,
                    "Upload confirmed"
                );
                None
            }
            Err(error) => {
                tracing::warn!(
                    state = %UploadState::ConfirmFailed,
                    attachment_key = %session.attachment_key,
                    error = %error,
                    "Upload transferred but not confirmed"
                );
                Some(error.to_string())
            }
        };

        Ok(UploadOutcome::Uploaded {
            attachment_key: session.attachment_key,
            confirm_warning,
        })
    }
}
