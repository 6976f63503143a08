//! MCP server using rmcp SDK
//!
//! Exposes record creation and attachment ingestion as MCP tools over stdio.

use crate::guide;
use crate::tools::*;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use shelfmark_api_client::ApiClient;
use shelfmark_core::{
    AttachmentRequest, AttachmentResult, ErrorMetadata, ItemType, LogLevel, RecordError,
    ZoteroConfig,
};
use shelfmark_ingest::AttachmentPipeline;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

const DEFAULT_ITEM_TYPE: &str = "webpage";

fn text_content(s: impl Into<String>) -> Content {
    Content {
        raw: RawContent::Text(RawTextContent { text: s.into() }),
        annotations: None,
    }
}

fn internal_error(message: impl Into<String>) -> ErrorData {
    ErrorData {
        code: ErrorCode(-32603),
        message: Cow::from(message.into()),
        data: None,
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string(value).map_err(|e| internal_error(e.to_string()))?;
    Ok(CallToolResult::success(vec![text_content(text)]))
}

/// Result of `save_to_zotero`. The record and its attachment are reported
/// separately: a failed attachment never hides a created record.
#[derive(Debug, Clone, Serialize)]
pub struct SaveItemResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_attachment: Option<AttachmentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_attachment: Option<AttachmentResult>,
}

impl SaveItemResponse {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            item_key: None,
            message: None,
            error: Some(error.into()),
            error_code: None,
            pdf_attachment: None,
            snapshot_attachment: None,
        }
    }

    fn record_failed(error: &RecordError) -> Self {
        Self {
            error_code: Some(error.error_code()),
            ..Self::failed(format!("Failed to create item: {}", error))
        }
    }

    fn created(item_key: String, message: String) -> Self {
        Self {
            success: true,
            item_key: Some(item_key),
            message: Some(message),
            error: None,
            error_code: None,
            pdf_attachment: None,
            snapshot_attachment: None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn log_record_failure(error: &RecordError, item_type: ItemType) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error_code = code, error = %error, item_type = %item_type, "Failed to create item")
        }
        LogLevel::Warn => {
            tracing::warn!(error_code = code, error = %error, item_type = %item_type, "Failed to create item")
        }
        LogLevel::Error => {
            tracing::error!(error_code = code, error = %error, item_type = %item_type, "Failed to create item")
        }
    }
}

#[derive(Clone)]
pub struct ShelfmarkService {
    api_client: Arc<ApiClient>,
    pipeline: AttachmentPipeline,
    tool_router: ToolRouter<ShelfmarkService>,
}

#[tool_router]
impl ShelfmarkService {
    pub fn new(api_client: ApiClient, pipeline: AttachmentPipeline) -> Self {
        Self {
            api_client: Arc::new(api_client),
            pipeline,
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_config(config: &ZoteroConfig) -> anyhow::Result<Self> {
        let api_client = ApiClient::new(config)?;
        let pipeline = AttachmentPipeline::from_config(config)?;
        Ok(Self::new(api_client, pipeline))
    }

    /// Create the record, then attach the PDF (or, failing a PDF URL, the
    /// snapshot) under it.
    pub async fn save_item(&self, req: &SaveToZoteroRequest) -> SaveItemResponse {
        let requested = non_blank(req.item_type.as_deref()).unwrap_or(DEFAULT_ITEM_TYPE);
        let item_type = match requested.parse::<ItemType>() {
            Ok(item_type) => item_type,
            Err(e) => return SaveItemResponse::failed(e.to_string()),
        };

        let item_key = match self
            .api_client
            .create_metadata_record(item_type, &req.to_draft())
            .await
        {
            Ok(key) => key,
            Err(e) => {
                log_record_failure(&e, item_type);
                return SaveItemResponse::record_failed(&e);
            }
        };

        let mut response = SaveItemResponse::created(
            item_key.clone(),
            format!("Created {}: {}", item_type.zotero_name(), req.title),
        );

        if let Some(pdf_url) = non_blank(req.pdf_url.as_deref()) {
            let request = AttachmentRequest::new(item_key, pdf_url);
            response.pdf_attachment = Some(self.pipeline.attach_pdf(&request).await);
        } else if let Some(snapshot_url) = non_blank(req.snapshot_url.as_deref()) {
            let request = AttachmentRequest::new(item_key, snapshot_url);
            response.snapshot_attachment = Some(self.pipeline.attach_snapshot(&request).await);
        }

        response
    }

    #[tool(
        description = "Create a new item in the Zotero library. Include pdf_url to attach a PDF, or snapshot_url to attach a web page snapshot (pdf_url wins if both are given)."
    )]
    async fn save_to_zotero(
        &self,
        Parameters(req): Parameters<SaveToZoteroRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        if req.title.trim().is_empty() {
            return Err(ErrorData {
                code: ErrorCode(-32602),
                message: Cow::from("title must not be empty"),
                data: None,
            });
        }
        json_result(&self.save_item(&req).await)
    }

    #[tool(description = "Download a PDF from a URL and attach it to an existing Zotero item")]
    async fn attach_pdf_from_url(
        &self,
        Parameters(req): Parameters<AttachPdfRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.pipeline.attach_pdf(&req.into()).await;
        json_result(&result)
    }

    #[tool(
        description = "Save a web page as an HTML snapshot and attach it to an existing Zotero item"
    )]
    async fn attach_snapshot(
        &self,
        Parameters(req): Parameters<AttachSnapshotRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.pipeline.attach_snapshot(&req.into()).await;
        json_result(&result)
    }

    #[tool(description = "List all collections (folders) in the Zotero library")]
    async fn list_zotero_collections(&self) -> Result<CallToolResult, ErrorData> {
        let collections = self
            .api_client
            .list_collections()
            .await
            .map_err(|e| internal_error(e.to_string()))?;
        json_result(&collections)
    }

    #[tool(
        description = "Get workflow instructions for adding items to Zotero. Call this at the start of a Zotero task or when unsure how to proceed."
    )]
    async fn get_zotero_help(&self) -> Result<CallToolResult, ErrorData> {
        json_result(&guide::help())
    }

    #[tool(
        description = "Get instructions for fetching a URL before saving it to Zotero. Does not fetch the URL itself."
    )]
    async fn prepare_url_for_zotero(
        &self,
        Parameters(req): Parameters<PrepareUrlRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        if req.url.trim().is_empty() {
            return Err(ErrorData {
                code: ErrorCode(-32602),
                message: Cow::from("url must not be empty"),
                data: None,
            });
        }
        json_result(&guide::prepare_url(req.url.trim()))
    }

    #[tool(description = "List the item types accepted by save_to_zotero")]
    async fn get_zotero_item_types(&self) -> Result<CallToolResult, ErrorData> {
        json_result(&ItemType::short_names())
    }
}

#[tool_handler]
impl ServerHandler for ShelfmarkService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "shelfmark-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Shelfmark MCP: create Zotero items, attach PDFs and page snapshots, list \
                 collections and item types. Call get_zotero_help for the workflow. \
                 Set ZOTERO_API_KEY and ZOTERO_LIBRARY_ID."
                    .to_string(),
            ),
        }
    }
}
