//! Shelfmark ingestion
//!
//! Turns a source URL into a stored attachment: unwrap renderer and proxy
//! URLs, download the resource, fingerprint it and run the upload handshake
//! against an [`AttachmentStore`](shelfmark_core::AttachmentStore).

pub mod fetcher;
pub mod fingerprint;
pub mod pipeline;
pub mod resolver;
pub mod upload;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use fetcher::ContentFetcher;
pub use fingerprint::{fingerprint, fingerprint_at};
pub use pipeline::AttachmentPipeline;
pub use resolver::resolve;
pub use upload::{UploadFailure, UploadProtocol, UploadState};
