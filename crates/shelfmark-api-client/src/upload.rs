//! File upload handshake against the Zotero API.
//!
//! `POST /items/{key}/file` is used twice: once with the content fingerprint to
//! obtain an upload slot, once with the upload key to register the file. Both
//! carry `If-None-Match: *` so an existing file is never silently replaced.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde_json::Value;
use shelfmark_core::{
    AttachmentStore, ContentFingerprint, NewAttachment, UploadAuthorization, UploadError,
    UploadTarget,
};

use crate::api::WriteFailure;
use crate::{error_text, ApiClient};

impl ApiClient {
    fn file_url(&self, attachment_key: &str) -> String {
        self.build_url(&format!("/items/{}/file", attachment_key))
    }
}

#[async_trait]
impl AttachmentStore for ApiClient {
    async fn register_attachment(
        &self,
        attachment: &NewAttachment,
    ) -> Result<String, UploadError> {
        self.write_single_item(&attachment.to_template())
            .await
            .map_err(|failure| match failure {
                WriteFailure::Transport(e) | WriteFailure::Rejected(e) => {
                    UploadError::RegisterFailed(e)
                }
            })
    }

    async fn authorize_upload(
        &self,
        attachment_key: &str,
        filename: &str,
        fingerprint: &ContentFingerprint,
    ) -> Result<UploadAuthorization, UploadError> {
        let form = [
            ("md5", fingerprint.md5.clone()),
            ("filename", filename.to_string()),
            ("filesize", fingerprint.length.to_string()),
            ("mtime", fingerprint.mtime.to_string()),
        ];

        let response = self
            .apply_form_auth(self.client().post(self.file_url(attachment_key)))
            .header(IF_NONE_MATCH, "*")
            .form(&form)
            .send()
            .await
            .map_err(|e| UploadError::AuthFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = error_text(response).await;
            return Err(UploadError::AuthFailed(format!("HTTP {}: {}", status, text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UploadError::AuthFailed(format!("Unexpected response body: {}", e)))?;

        UploadAuthorization::from_json(body)
            .map_err(|e| UploadError::AuthFailed(format!("Unexpected response body: {}", e)))
    }

    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), UploadError> {
        // Storage targets are pre-signed; library credentials are not sent.
        let response = self
            .client()
            .post(&target.url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::TransferFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = error_text(response).await;
            return Err(UploadError::TransferFailed(format!(
                "Storage returned HTTP {}: {}",
                status, text
            )));
        }

        Ok(())
    }

    async fn confirm_upload(
        &self,
        attachment_key: &str,
        upload_key: &str,
    ) -> Result<(), UploadError> {
        let response = self
            .apply_form_auth(self.client().post(self.file_url(attachment_key)))
            .header(IF_NONE_MATCH, "*")
            .form(&[("upload", upload_key)])
            .send()
            .await
            .map_err(|e| UploadError::ConfirmFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = error_text(response).await;
            return Err(UploadError::ConfirmFailed(format!("HTTP {}: {}", status, text)));
        }

        Ok(())
    }
}
