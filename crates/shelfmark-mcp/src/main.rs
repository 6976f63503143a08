//! Shelfmark MCP Server
//!
//! Model Context Protocol server for a Zotero library
//! Run with: ZOTERO_API_KEY=xxx ZOTERO_LIBRARY_ID=xxx shelfmark-mcp

use anyhow::Context;
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;
use shelfmark_core::ZoteroConfig;
use shelfmark_mcp::ShelfmarkService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    let config = ZoteroConfig::from_env().context(
        "Failed to load configuration. Set ZOTERO_API_KEY and ZOTERO_LIBRARY_ID environment variables",
    )?;
    tracing::info!(
        library = %config.library_prefix(),
        api_url = %config.api_base_url,
        "Starting Shelfmark MCP server"
    );

    let service = ShelfmarkService::from_config(&config)?;
    let running = service.serve(stdio()).await.context("MCP transport failed")?;
    running.waiting().await.context("MCP server error")?;

    Ok(())
}
