//! HTTP client for the Zotero Web API.
//!
//! Provides a minimal client carrying the library credentials, the record
//! operations the tool surface needs (create item, list collections) and the
//! `AttachmentStore` implementation that speaks the file upload handshake.

pub mod api;
pub mod upload;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use shelfmark_core::ZoteroConfig;
use std::time::Duration;

/// Zotero Web API version sent with every request.
pub const API_VERSION: &str = "3";
const API_VERSION_HEADER: &str = "Zotero-API-Version";

/// HTTP client for one Zotero library.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    library_prefix: String,
    auth_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ZoteroConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            library_prefix: config.library_prefix(),
            auth_headers: build_auth_headers(&config.api_key)?,
        })
    }

    /// Full URL for a library-relative path such as `/items`.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.library_prefix, path)
    }

    /// Headers identifying the caller to the API: Authorization, API
    /// version and Content-Type.
    pub fn auth_headers(&self) -> &HeaderMap {
        &self.auth_headers
    }

    /// Attach [`auth_headers`](Self::auth_headers) to a JSON request.
    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.headers(self.auth_headers.clone())
    }

    /// Same as [`apply_auth`](Self::apply_auth) minus Content-Type, which the
    /// form body sets.
    fn apply_form_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut headers = self.auth_headers.clone();
        headers.remove(CONTENT_TYPE);
        request.headers(headers)
    }

    /// Raw client for requests outside the library API (storage targets).
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn build_auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .context("API key contains characters not allowed in a header")?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Body text of a failed response, for error messages.
pub(crate) async fn error_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
