use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::upload::UploadOutcome;

/// What the pipeline should do with the fetched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Binary document stored as `application/pdf`.
    Pdf,
    /// Web page stored as an HTML snapshot.
    Snapshot,
}

impl AttachmentKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            AttachmentKind::Pdf => "application/pdf",
            AttachmentKind::Snapshot => "text/html",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Pdf => write!(f, "pdf"),
            AttachmentKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// One request to attach remote content to an existing record.
#[derive(Debug, Clone)]
pub struct AttachmentRequest {
    pub parent_key: String,
    pub source_url: String,
    pub filename: Option<String>,
    pub title: Option<String>,
}

impl AttachmentRequest {
    pub fn new(parent_key: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            parent_key: parent_key.into(),
            source_url: source_url.into(),
            filename: None,
            title: None,
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Resource retrieved by the fetcher, owned by a single pipeline run.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
    /// Page title, only set for snapshots.
    pub title: Option<String>,
}

impl FetchedContent {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    /// Bytes were transferred and the upload registered.
    Created,
    /// The server already had content with this hash; nothing transferred.
    Exists,
    /// The attachment record exists but the file could not be authorized.
    CreatedOnly,
    UploadFailed,
    FetchFailed,
}

impl AttachmentStatus {
    /// `CreatedOnly` counts as success: the record is usable without its file.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AttachmentStatus::Created | AttachmentStatus::Exists | AttachmentStatus::CreatedOnly
        )
    }
}

/// Terminal outcome of one `attach` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentResult {
    pub success: bool,
    pub status: AttachmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl AttachmentResult {
    fn with_status(status: AttachmentStatus) -> Self {
        Self {
            success: status.is_success(),
            status,
            attachment_key: None,
            filename: None,
            title: None,
            size_bytes: None,
            error: None,
            warning: None,
        }
    }

    pub fn fetch_failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(AttachmentStatus::FetchFailed)
        }
    }

    /// Upload failure for `content`; `attachment_key` is set when the
    /// attachment record was created before the failing step.
    pub fn upload_failed(
        content: &FetchedContent,
        attachment_key: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            attachment_key,
            filename: Some(content.filename.clone()),
            title: content.title.clone(),
            size_bytes: Some(content.len() as u64),
            error: Some(error.into()),
            ..Self::with_status(AttachmentStatus::UploadFailed)
        }
    }

    pub fn from_outcome(content: &FetchedContent, outcome: UploadOutcome) -> Self {
        let (status, key, error, warning) = match outcome {
            UploadOutcome::Uploaded {
                attachment_key,
                confirm_warning,
            } => (
                AttachmentStatus::Created,
                attachment_key,
                None,
                confirm_warning,
            ),
            UploadOutcome::Exists { attachment_key } => {
                (AttachmentStatus::Exists, attachment_key, None, None)
            }
            UploadOutcome::CreatedOnly {
                attachment_key,
                reason,
            } => (
                AttachmentStatus::CreatedOnly,
                attachment_key,
                Some(reason),
                None,
            ),
        };

        Self {
            attachment_key: Some(key),
            filename: Some(content.filename.clone()),
            title: content.title.clone(),
            size_bytes: Some(content.len() as u64),
            error,
            warning,
            ..Self::with_status(status)
        }
    }
}
