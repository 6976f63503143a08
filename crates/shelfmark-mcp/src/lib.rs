//! Shelfmark MCP Server
//!
//! Model Context Protocol server that lets AI assistants create Zotero
//! records and attach PDFs or page snapshots to them.

pub mod guide;
pub mod server;
pub mod tools;

pub use server::{SaveItemResponse, ShelfmarkService};
