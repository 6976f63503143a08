//! Content fetcher
//!
//! One GET per resource with a fixed user agent and timeout, redirects
//! followed, body buffered in memory. Naming rules:
//! - PDF: `Content-Disposition` filename, else the last URL path segment; a
//!   name without `.pdf` becomes `attachment.pdf`.
//! - Snapshot: sanitized `<title>` (or the URL) plus `.html`.

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{redirect, Client, Url};
use shelfmark_core::{AttachmentKind, FetchError, FetchedContent, ZoteroConfig};
use std::sync::LazyLock;
use std::time::Duration;

const DEFAULT_PDF_FILENAME: &str = "attachment.pdf";
const DEFAULT_SNAPSHOT_NAME: &str = "snapshot";
const MAX_FILENAME_CHARS: usize = 80;
const MAX_REDIRECTS: usize = 10;

static TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is a valid regex")
});

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#)
        .expect("disposition pattern is a valid regex")
});

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s\-.]").expect("filename pattern is a valid regex")
});

#[derive(Clone, Debug)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ZoteroConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )
    }

    /// Download `url` and derive the attachment filename for `kind`.
    pub async fn fetch(&self, url: &str, kind: AttachmentKind) -> Result<FetchedContent, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let declared_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let bytes = response.bytes().await.map_err(transport)?;

        tracing::debug!(
            url = %url,
            size_bytes = bytes.len(),
            declared_type = %declared_type,
            "Fetched content"
        );

        let (filename, title) = match kind {
            AttachmentKind::Pdf => (pdf_filename(url, content_disposition.as_deref()), None),
            AttachmentKind::Snapshot => {
                let html = String::from_utf8_lossy(&bytes);
                let title = extract_title(&html).unwrap_or_else(|| url.to_string());
                (snapshot_filename(&title), Some(title))
            }
        };

        Ok(FetchedContent {
            bytes,
            content_type: kind.content_type().to_string(),
            filename,
            title,
        })
    }
}

/// Filename for a downloaded PDF.
pub fn pdf_filename(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(disposition_filename)
        .or_else(|| last_path_segment(url))
        .filter(|name| name.to_lowercase().ends_with(".pdf"))
        .unwrap_or_else(|| DEFAULT_PDF_FILENAME.to_string())
}

/// `filename=` value of a Content-Disposition header, without quotes or
/// directory components. A quoted value may contain `;`.
fn disposition_filename(header: &str) -> Option<String> {
    let caps = DISPOSITION_FILENAME.captures(header)?;
    let value = match caps.get(1) {
        Some(quoted) => quoted.as_str(),
        None => caps.get(2)?.as_str().trim().trim_matches('\''),
    };
    value
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

/// Text of the first `<title>` element, trimmed; `None` only if there is no
/// such element. A blank title stays blank and names the file `snapshot.html`.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Filesystem-safe token: word characters, whitespace, `-` and `.` only,
/// at most 80 characters, trimmed.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(title, "");
    let truncated: String = cleaned.chars().take(MAX_FILENAME_CHARS).collect();
    let trimmed = truncated.trim();
    if trimmed.is_empty() {
        DEFAULT_SNAPSHOT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn snapshot_filename(title: &str) -> String {
    format!("{}.html", sanitize_filename(title))
}
