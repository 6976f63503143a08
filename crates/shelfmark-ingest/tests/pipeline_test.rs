//! End-to-end pipeline runs against a mock origin and a mock Zotero API.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use shelfmark_core::{AttachmentRequest, AttachmentStatus, LibraryType, ZoteroConfig};
use shelfmark_ingest::AttachmentPipeline;

const PDF_BYTES: &str = "%PDF-1.4 test";
const PDF_MD5: &str = "662d150c1c021efdffc61004e797114b";

fn pipeline_for(server: &ServerGuard) -> AttachmentPipeline {
    let config =
        ZoteroConfig::new("test-key", "123", LibraryType::User).with_api_base_url(server.url());
    AttachmentPipeline::from_config(&config).unwrap()
}

async fn register_mock(server: &mut ServerGuard, content_type: &str) -> Mock {
    server
        .mock("POST", "/users/123/items")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""parentItem":"PARENT01""#.to_string()),
            Matcher::Regex(format!(r#""contentType":"{}""#, content_type)),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "successful": { "0": { "key": "ATTACH01" } }, "failed": {} }).to_string())
        .create_async()
        .await
}

async fn authorize_mock(server: &mut ServerGuard, status: usize, body: String) -> Mock {
    server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .match_header("if-none-match", "*")
        .match_body(Matcher::UrlEncoded("md5".to_string(), PDF_MD5.to_string()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn origin_pdf(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/papers/paper.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(PDF_BYTES)
        .create_async()
        .await
}

#[tokio::test]
async fn test_pdf_full_upload_is_created() {
    let mut server = mockito::Server::new_async().await;
    let _origin = origin_pdf(&mut server).await;
    let _register = register_mock(&mut server, "application/pdf").await;
    let storage_url = format!("{}/storage/upload", server.url());
    let authorize = authorize_mock(
        &mut server,
        200,
        json!({
            "url": storage_url,
            "contentType": "multipart/form-data; boundary=X",
            "prefix": "PREFIX",
            "suffix": "SUFFIX",
            "uploadKey": "UPKEY1"
        })
        .to_string(),
    )
    .await;
    let transfer = server
        .mock("POST", "/storage/upload")
        .match_header("authorization", Matcher::Missing)
        .match_header("content-type", "multipart/form-data; boundary=X")
        .match_body(Matcher::Exact(format!("PREFIX{}SUFFIX", PDF_BYTES)))
        .with_status(201)
        .create_async()
        .await;
    let confirm = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .match_header("if-none-match", "*")
        .match_body(Matcher::UrlEncoded("upload".to_string(), "UPKEY1".to_string()))
        .with_status(204)
        .create_async()
        .await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/papers/paper.pdf", server.url()));
    let result = pipeline_for(&server).attach_pdf(&request).await;

    assert_eq!(result.status, AttachmentStatus::Created);
    assert!(result.success);
    assert_eq!(result.attachment_key.as_deref(), Some("ATTACH01"));
    assert_eq!(result.filename.as_deref(), Some("paper.pdf"));
    assert_eq!(result.size_bytes, Some(PDF_BYTES.len() as u64));
    assert_eq!(result.warning, None);
    authorize.assert_async().await;
    transfer.assert_async().await;
    confirm.assert_async().await;
}

#[tokio::test]
async fn test_existing_content_skips_transfer() {
    let mut server = mockito::Server::new_async().await;
    let _origin = origin_pdf(&mut server).await;
    let _register = register_mock(&mut server, "application/pdf").await;
    let _authorize = authorize_mock(&mut server, 200, json!({ "exists": 1 }).to_string()).await;
    let transfer = server
        .mock("POST", "/storage/upload")
        .expect(0)
        .create_async()
        .await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/papers/paper.pdf", server.url()));
    let result = pipeline_for(&server).attach_pdf(&request).await;

    assert_eq!(result.status, AttachmentStatus::Exists);
    assert_eq!(result.attachment_key.as_deref(), Some("ATTACH01"));
    transfer.assert_async().await;
}

#[tokio::test]
async fn test_authorization_refused_is_created_only() {
    let mut server = mockito::Server::new_async().await;
    let _origin = origin_pdf(&mut server).await;
    let _register = register_mock(&mut server, "application/pdf").await;
    let _authorize = authorize_mock(&mut server, 403, "File editing denied".to_string()).await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/papers/paper.pdf", server.url()));
    let result = pipeline_for(&server).attach_pdf(&request).await;

    assert_eq!(result.status, AttachmentStatus::CreatedOnly);
    assert!(result.success);
    assert_eq!(result.attachment_key.as_deref(), Some("ATTACH01"));
    let error = result.error.unwrap();
    assert!(error.contains("403"));
    assert!(error.contains("File editing denied"));
}

#[tokio::test]
async fn test_missing_source_makes_no_api_calls() {
    let mut server = mockito::Server::new_async().await;
    let _origin = server
        .mock("GET", "/papers/gone.pdf")
        .with_status(404)
        .create_async()
        .await;
    let api = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/papers/gone.pdf", server.url()));
    let result = pipeline_for(&server).attach_pdf(&request).await;

    assert_eq!(result.status, AttachmentStatus::FetchFailed);
    assert!(!result.success);
    assert!(result.attachment_key.is_none());
    assert!(result.error.unwrap().contains("404"));
    api.assert_async().await;
}

#[tokio::test]
async fn test_register_rejection_is_upload_failed_without_key() {
    let mut server = mockito::Server::new_async().await;
    let _origin = origin_pdf(&mut server).await;
    let _register = server
        .mock("POST", "/users/123/items")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "successful": {},
                "failed": { "0": { "code": 400, "message": "Parent item PARENT01 not found" } }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/papers/paper.pdf", server.url()));
    let result = pipeline_for(&server).attach_pdf(&request).await;

    assert_eq!(result.status, AttachmentStatus::UploadFailed);
    assert!(result.attachment_key.is_none());
    assert!(result.error.unwrap().contains("Parent item PARENT01 not found"));
}

#[tokio::test]
async fn test_snapshot_named_after_page_title() {
    let mut server = mockito::Server::new_async().await;
    let _origin = server
        .mock("GET", "/reports/acme")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><head><title>Acme Report 2025</title></head><body></body></html>")
        .create_async()
        .await;
    let _register = server
        .mock("POST", "/users/123/items")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""filename":"Acme Report 2025.html""#.to_string()),
            Matcher::Regex(r#""contentType":"text/html""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "successful": { "0": { "key": "ATTACH01" } }, "failed": {} }).to_string())
        .create_async()
        .await;
    let _authorize = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .match_body(Matcher::UrlEncoded(
            "filename".to_string(),
            "Acme Report 2025.html".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "exists": true }).to_string())
        .create_async()
        .await;

    let request = AttachmentRequest::new("PARENT01", format!("{}/reports/acme", server.url()));
    let result = pipeline_for(&server).attach_snapshot(&request).await;

    assert_eq!(result.status, AttachmentStatus::Exists);
    assert_eq!(result.filename.as_deref(), Some("Acme Report 2025.html"));
    assert_eq!(result.title.as_deref(), Some("Acme Report 2025"));
}
