//! Attachment pipeline
//!
//! resolve -> fetch -> fingerprint -> upload. Every failure is folded into the
//! returned [`AttachmentResult`]; nothing escapes to the caller.

use crate::fetcher::{snapshot_filename, ContentFetcher};
use crate::fingerprint::fingerprint;
use crate::resolver::resolve;
use crate::upload::UploadProtocol;
use anyhow::Result;
use shelfmark_api_client::ApiClient;
use shelfmark_core::{
    AttachmentKind, AttachmentRequest, AttachmentResult, AttachmentStore, ErrorMetadata,
    FetchedContent, LogLevel, ZoteroConfig,
};
use std::fmt::Display;
use std::sync::Arc;

#[derive(Clone)]
pub struct AttachmentPipeline {
    fetcher: ContentFetcher,
    store: Arc<dyn AttachmentStore>,
}

impl AttachmentPipeline {
    pub fn new(fetcher: ContentFetcher, store: Arc<dyn AttachmentStore>) -> Self {
        Self { fetcher, store }
    }

    /// Pipeline backed by the Zotero Web API described by `config`.
    pub fn from_config(config: &ZoteroConfig) -> Result<Self> {
        let client = ApiClient::new(config)?;
        let fetcher = ContentFetcher::from_config(config)?;
        Ok(Self::new(fetcher, Arc::new(client)))
    }

    /// Attach a PDF downloaded from `request.source_url`.
    pub async fn attach_pdf(&self, request: &AttachmentRequest) -> AttachmentResult {
        self.attach(request, AttachmentKind::Pdf).await
    }

    /// Attach an HTML snapshot of `request.source_url`.
    pub async fn attach_snapshot(&self, request: &AttachmentRequest) -> AttachmentResult {
        self.attach(request, AttachmentKind::Snapshot).await
    }

    #[tracing::instrument(
        skip(self, request, kind),
        fields(parent_key = %request.parent_key, kind = %kind)
    )]
    pub async fn attach(
        &self,
        request: &AttachmentRequest,
        kind: AttachmentKind,
    ) -> AttachmentResult {
        let url = resolve(&request.source_url);

        let content = match self.fetcher.fetch(&url, kind).await {
            Ok(content) => apply_overrides(content, request, kind),
            Err(e) => {
                log_failure(&e, "Failed to download attachment source");
                return AttachmentResult::fetch_failed(format!(
                    "Failed to download {}: {}",
                    kind, e
                ));
            }
        };

        let fp = fingerprint(&content.bytes);
        let protocol = UploadProtocol::new(self.store.as_ref());

        let result = match protocol.run(&request.parent_key, &content, fp).await {
            Ok(outcome) => AttachmentResult::from_outcome(&content, outcome),
            Err(failure) => {
                log_failure(&failure.error, "Attachment upload failed");
                AttachmentResult::upload_failed(
                    &content,
                    failure.attachment_key,
                    failure.error.to_string(),
                )
            }
        };

        tracing::info!(
            status = ?result.status,
            attachment_key = result.attachment_key.as_deref().unwrap_or(""),
            filename = %content.filename,
            size_bytes = content.len(),
            "Attachment processed"
        );

        result
    }
}

/// Caller-supplied names win over derived ones.
fn apply_overrides(
    mut content: FetchedContent,
    request: &AttachmentRequest,
    kind: AttachmentKind,
) -> FetchedContent {
    if kind == AttachmentKind::Snapshot {
        if let Some(title) = &request.title {
            content.filename = snapshot_filename(title);
            content.title = Some(title.clone());
        }
    }
    if let Some(filename) = &request.filename {
        content.filename = filename.clone();
    }
    content
}

fn log_failure<E: ErrorMetadata + Display>(error: &E, message: &str) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error_code = code, error = %error, "{}", message),
        LogLevel::Warn => tracing::warn!(error_code = code, error = %error, "{}", message),
        LogLevel::Error => tracing::error!(error_code = code, error = %error, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{InMemoryAttachmentStore, StoreFailure};
    use shelfmark_core::AttachmentStatus;
    use std::time::Duration;

    fn pipeline(store: &InMemoryAttachmentStore) -> AttachmentPipeline {
        let fetcher = ContentFetcher::new(Duration::from_secs(5), "Shelfmark-Test/1.0").unwrap();
        AttachmentPipeline::new(fetcher, Arc::new(store.clone()))
    }

    async fn serve_pdf(
        server: &mut mockito::ServerGuard,
        path: &str,
        body: &'static [u8],
    ) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn test_overrides_apply_to_snapshot() {
        let content = FetchedContent {
            bytes: bytes::Bytes::from_static(b"<html></html>"),
            content_type: "text/html".to_string(),
            filename: "Derived.html".to_string(),
            title: Some("Derived".to_string()),
        };
        let request = AttachmentRequest::new("P", "https://example.com")
            .with_title(Some("Chosen: Title".to_string()));

        let content = apply_overrides(content, &request, AttachmentKind::Snapshot);
        assert_eq!(content.filename, "Chosen Title.html");
        assert_eq!(content.title.as_deref(), Some("Chosen: Title"));
    }

    #[test]
    fn test_title_override_ignored_for_pdf() {
        let content = FetchedContent {
            bytes: bytes::Bytes::from_static(b"%PDF"),
            content_type: "application/pdf".to_string(),
            filename: "paper.pdf".to_string(),
            title: None,
        };
        let request = AttachmentRequest::new("P", "https://example.com/paper.pdf")
            .with_title(Some("Ignored".to_string()))
            .with_filename(Some("renamed.pdf".to_string()));

        let content = apply_overrides(content, &request, AttachmentKind::Pdf);
        assert_eq!(content.filename, "renamed.pdf");
        assert_eq!(content.title, None);
    }

    #[tokio::test]
    async fn test_attach_pdf_twice_reaches_exists() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = serve_pdf(&mut server, "/paper.pdf", b"%PDF-1.7 identical").await;
        let store = InMemoryAttachmentStore::new();
        let pipeline = pipeline(&store);
        let request = AttachmentRequest::new("PARENT01", format!("{}/paper.pdf", server.url()));

        let first = pipeline.attach_pdf(&request).await;
        let second = pipeline.attach_pdf(&request).await;

        assert_eq!(first.status, AttachmentStatus::Created);
        assert_eq!(second.status, AttachmentStatus::Exists);
        assert!(second.success);
        assert_eq!(store.transfers().len(), 1);
    }

    #[tokio::test]
    async fn test_wrapper_url_fetches_inner_resource() {
        let mut server = mockito::Server::new_async().await;
        let inner = serve_pdf(&mut server, "/real/paper.pdf", b"%PDF-1.4").await;
        let wrapper = format!(
            "{}/pdf.svc?url={}",
            server.url(),
            urlencoding::encode(&format!("{}/real/paper.pdf", server.url()))
        );
        let store = InMemoryAttachmentStore::new();

        let result = pipeline(&store)
            .attach_pdf(&AttachmentRequest::new("PARENT01", wrapper))
            .await;

        inner.assert_async().await;
        assert_eq!(result.status, AttachmentStatus::Created);
        assert_eq!(result.filename.as_deref(), Some("paper.pdf"));
        let stored = store.attachment(result.attachment_key.as_deref().unwrap()).unwrap();
        assert_eq!(stored.parent_key, "PARENT01");
        assert_eq!(stored.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_fetch_failure_never_touches_store() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/gone.pdf")
            .with_status(404)
            .create_async()
            .await;
        let store = InMemoryAttachmentStore::new();

        let result = pipeline(&store)
            .attach_pdf(&AttachmentRequest::new("PARENT01", format!("{}/gone.pdf", server.url())))
            .await;

        assert_eq!(result.status, AttachmentStatus::FetchFailed);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("404"));
        assert_eq!(store.register_count(), 0);
    }

    #[tokio::test]
    async fn test_transfer_failure_keeps_attachment_key() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = serve_pdf(&mut server, "/paper.pdf", b"%PDF").await;
        let store = InMemoryAttachmentStore::new().failing(StoreFailure::Transfer);

        let result = pipeline(&store)
            .attach_pdf(&AttachmentRequest::new("PARENT01", format!("{}/paper.pdf", server.url())))
            .await;

        assert_eq!(result.status, AttachmentStatus::UploadFailed);
        assert_eq!(result.attachment_key.as_deref(), Some("ATTACH01"));
        assert_eq!(result.size_bytes, Some(4));
    }

    #[tokio::test]
    async fn test_authorization_refused_is_created_only() {
        let mut server = mockito::Server::new_async().await;
        let _pdf = serve_pdf(&mut server, "/paper.pdf", b"%PDF").await;
        let store = InMemoryAttachmentStore::new().failing(StoreFailure::Authorize);

        let result = pipeline(&store)
            .attach_pdf(&AttachmentRequest::new("PARENT01", format!("{}/paper.pdf", server.url())))
            .await;

        assert_eq!(result.status, AttachmentStatus::CreatedOnly);
        assert!(result.success);
        assert!(result.error.unwrap().contains("403"));
    }
}
