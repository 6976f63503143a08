//! Shelfmark Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! attachment store seam shared by the API client, the ingestion pipeline and
//! the MCP server.

pub mod config;
pub mod error;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::{LibraryType, ZoteroConfig};
pub use error::{ErrorMetadata, FetchError, LogLevel, RecordError, UploadError};
pub use models::{
    AttachmentKind, AttachmentRequest, AttachmentResult, AttachmentStatus, Collection,
    ContentFingerprint, FetchedContent, ItemDraft, ItemType, UploadAuthorization, UploadOutcome,
    UploadSession, UploadTarget,
};
pub use store::{AttachmentStore, NewAttachment};
