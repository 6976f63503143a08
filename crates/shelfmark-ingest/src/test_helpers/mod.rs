//! Test helpers for ingestion unit tests
//!
//! An in-memory [`AttachmentStore`](shelfmark_core::AttachmentStore) that
//! deduplicates by content hash the way the remote file store does, so the
//! handshake can be exercised without a network.

pub mod memory_store;

pub use memory_store::*;
