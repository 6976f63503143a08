//! Wire-level tests for the upload handshake against a mock Zotero API.

use bytes::Bytes;
use mockito::Matcher;
use serde_json::json;
use shelfmark_api_client::ApiClient;
use shelfmark_core::{
    AttachmentStore, ContentFingerprint, LibraryType, NewAttachment, UploadAuthorization,
    UploadError, ZoteroConfig,
};

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    let config =
        ZoteroConfig::new("test-key", "123", LibraryType::User).with_api_base_url(server.url());
    ApiClient::new(&config).unwrap()
}

fn fingerprint() -> ContentFingerprint {
    ContentFingerprint {
        md5: "8d777f385d3dfec8815d20f7496026dc".to_string(),
        length: 4,
        mtime: 1_735_689_600_000,
    }
}

#[tokio::test]
async fn test_register_attachment_posts_imported_file_template() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/123/items")
        .match_header("authorization", "Bearer test-key")
        .match_header("zotero-api-version", "3")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""itemType":"attachment""#.to_string()),
            Matcher::Regex(r#""linkMode":"imported_file""#.to_string()),
            Matcher::Regex(r#""parentItem":"PARENT01""#.to_string()),
            Matcher::Regex(r#""md5":"8d777f385d3dfec8815d20f7496026dc""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "successful": { "0": { "key": "ATTACH01" } },
                "success": { "0": "ATTACH01" },
                "failed": {}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let key = client
        .register_attachment(&NewAttachment {
            parent_key: "PARENT01".to_string(),
            filename: "paper.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            fingerprint: fingerprint(),
        })
        .await
        .unwrap();

    assert_eq!(key, "ATTACH01");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_register_attachment_propagates_remote_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/123/items")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "successful": {},
                "failed": { "0": { "code": 400, "message": "Parent item MISSING not found" } }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .register_attachment(&NewAttachment {
            parent_key: "MISSING".to_string(),
            filename: "paper.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            fingerprint: fingerprint(),
        })
        .await;

    match result {
        Err(UploadError::RegisterFailed(message)) => {
            assert!(message.contains("Parent item MISSING not found"))
        }
        other => panic!("expected RegisterFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_authorize_upload_sends_conditional_form() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .match_header("if-none-match", "*")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "md5".to_string(),
                "8d777f385d3dfec8815d20f7496026dc".to_string(),
            ),
            Matcher::UrlEncoded("filename".to_string(), "paper.pdf".to_string()),
            Matcher::UrlEncoded("filesize".to_string(), "4".to_string()),
            Matcher::UrlEncoded("mtime".to_string(), "1735689600000".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "url": "https://storage.example.com/upload",
                "contentType": "multipart/form-data; boundary=xyz",
                "prefix": "--xyz\r\n",
                "suffix": "\r\n--xyz--",
                "uploadKey": "UPKEY"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let auth = client
        .authorize_upload("ATTACH01", "paper.pdf", &fingerprint())
        .await
        .unwrap();

    match auth {
        UploadAuthorization::Upload(target) => {
            assert_eq!(target.upload_key, "UPKEY");
            assert_eq!(target.url, "https://storage.example.com/upload");
        }
        other => panic!("expected upload target, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_authorize_upload_reports_existing_file() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"exists":1}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let auth = client
        .authorize_upload("ATTACH01", "paper.pdf", &fingerprint())
        .await
        .unwrap();

    assert_eq!(auth, UploadAuthorization::Exists);
}

#[tokio::test]
async fn test_authorize_upload_non_200_is_auth_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .with_status(412)
        .with_body("If-None-Match: * set but file exists")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .authorize_upload("ATTACH01", "paper.pdf", &fingerprint())
        .await;

    match result {
        Err(UploadError::AuthFailed(message)) => {
            assert!(message.contains("412"));
            assert!(message.contains("file exists"));
        }
        other => panic!("expected AuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transfer_posts_framed_body_without_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/storage")
        .match_header("content-type", "multipart/form-data; boundary=xyz")
        .match_header("authorization", Matcher::Missing)
        .match_body("--xyz\r\nDATA\r\n--xyz--")
        .with_status(201)
        .create_async()
        .await;

    let client = client_for(&server);
    let target = shelfmark_core::UploadTarget {
        url: format!("{}/storage", server.url()),
        prefix: "--xyz\r\n".to_string(),
        suffix: "\r\n--xyz--".to_string(),
        upload_key: "UPKEY".to_string(),
        content_type: Some("multipart/form-data; boundary=xyz".to_string()),
    };

    client
        .transfer(
            &target,
            "multipart/form-data; boundary=xyz",
            Bytes::from(target.frame(b"DATA")),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_transfer_failure_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/storage")
        .with_status(403)
        .with_body("SignatureDoesNotMatch")
        .create_async()
        .await;

    let client = client_for(&server);
    let target = shelfmark_core::UploadTarget {
        url: format!("{}/storage", server.url()),
        prefix: String::new(),
        suffix: String::new(),
        upload_key: "UPKEY".to_string(),
        content_type: None,
    };

    let result = client
        .transfer(&target, "application/pdf", Bytes::from_static(b"DATA"))
        .await;

    assert!(matches!(result, Err(UploadError::TransferFailed(_))));
}

#[tokio::test]
async fn test_confirm_upload_sends_upload_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/123/items/ATTACH01/file")
        .match_header("if-none-match", "*")
        .match_header("authorization", "Bearer test-key")
        .match_header("zotero-api-version", "3")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::UrlEncoded(
            "upload".to_string(),
            "UPKEY".to_string(),
        ))
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    client.confirm_upload("ATTACH01", "UPKEY").await.unwrap();

    mock.assert_async().await;
}
