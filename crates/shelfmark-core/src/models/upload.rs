use serde::Deserialize;
use serde_json::Value;

/// Content hash, size and modification time sent with an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFingerprint {
    /// Lower-case hex MD5 of the content.
    pub md5: String,
    pub length: u64,
    /// Milliseconds since the Unix epoch.
    pub mtime: i64,
}

/// Storage target handed out by the authorization step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub url: String,
    /// Opaque framing bytes sent before the content.
    #[serde(default)]
    pub prefix: String,
    /// Opaque framing bytes sent after the content.
    #[serde(default)]
    pub suffix: String,
    pub upload_key: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadTarget {
    /// Request body for the storage backend: `prefix ++ content ++ suffix`.
    pub fn frame(&self, content: &[u8]) -> Vec<u8> {
        let mut body =
            Vec::with_capacity(self.prefix.len() + content.len() + self.suffix.len());
        body.extend_from_slice(self.prefix.as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(self.suffix.as_bytes());
        body
    }
}

/// Successful answer to an upload authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadAuthorization {
    /// The server already stores content with this hash.
    Exists,
    Upload(UploadTarget),
}

impl UploadAuthorization {
    /// Parse the authorization body. `exists` may come back as a bool or as `1`.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let exists = match value.get("exists") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        };
        if exists {
            return Ok(UploadAuthorization::Exists);
        }
        serde_json::from_value(value).map(UploadAuthorization::Upload)
    }
}

/// State carried across the steps of one upload. Never shared between runs.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub attachment_key: String,
    pub fingerprint: ContentFingerprint,
}

impl UploadSession {
    pub fn new(attachment_key: String, fingerprint: ContentFingerprint) -> Self {
        Self {
            attachment_key,
            fingerprint,
        }
    }
}

/// How far the upload handshake got once the attachment record existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded {
        attachment_key: String,
        confirm_warning: Option<String>,
    },
    Exists {
        attachment_key: String,
    },
    CreatedOnly {
        attachment_key: String,
        reason: String,
    },
}

impl UploadOutcome {
    pub fn attachment_key(&self) -> &str {
        match self {
            UploadOutcome::Uploaded { attachment_key, .. }
            | UploadOutcome::Exists { attachment_key }
            | UploadOutcome::CreatedOnly { attachment_key, .. } => attachment_key,
        }
    }
}
