//! Error types module
//!
//! One error enum per pipeline layer. The orchestrator never lets these escape
//! to its caller: each is folded into an `AttachmentResult` at the stage
//! boundary, using `ErrorMetadata` to pick the log level and a stable code.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like a missing page
    Debug,
    /// Warning level - for degraded but usable outcomes
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logging and for tool responses.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FETCH_FAILED")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure retrieving the source resource.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
}

impl ErrorMetadata for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "FETCH_TRANSPORT",
            FetchError::HttpStatus { .. } => "FETCH_HTTP_STATUS",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            FetchError::Transport { .. } => LogLevel::Error,
            FetchError::HttpStatus { .. } => LogLevel::Warn,
        }
    }
}

/// Failure in one step of the attachment upload handshake.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    /// The attachment record was not created; carries the remote error verbatim.
    #[error("Register failed: {0}")]
    RegisterFailed(String),

    /// Upload authorization refused for a reason other than existing content.
    #[error("Upload authorization failed: {0}")]
    AuthFailed(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Confirm failed: {0}")]
    ConfirmFailed(String),
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::RegisterFailed(_) => "REGISTER_FAILED",
            UploadError::AuthFailed(_) => "AUTH_FAILED",
            UploadError::TransferFailed(_) => "TRANSFER_FAILED",
            UploadError::ConfirmFailed(_) => "CONFIRM_FAILED",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::AuthFailed(_) | UploadError::ConfirmFailed(_) => LogLevel::Warn,
            UploadError::RegisterFailed(_) | UploadError::TransferFailed(_) => LogLevel::Error,
        }
    }
}

/// Failure creating or reading records in the metadata layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid item template: {0}")]
    InvalidTemplate(String),

    #[error("Remote rejected request: {0}")]
    RemoteRejected(String),

    #[error("Request failed: {0}")]
    Transport(String),
}

impl ErrorMetadata for RecordError {
    fn error_code(&self) -> &'static str {
        match self {
            RecordError::InvalidTemplate(_) => "INVALID_TEMPLATE",
            RecordError::RemoteRejected(_) => "REMOTE_REJECTED",
            RecordError::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            RecordError::InvalidTemplate(_) => LogLevel::Debug,
            RecordError::RemoteRejected(_) => LogLevel::Warn,
            RecordError::Transport(_) => LogLevel::Error,
        }
    }
}
