//! Unwrapping of renderer and proxy URLs.
//!
//! PDF renderers, screenshot services and proxy scripts often embed the real
//! resource as a query parameter. `resolve` pulls that URL out so the fetcher
//! talks to the origin. Plain pages are left alone unless their path looks
//! like a service endpoint, so legitimate query strings survive.

use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;

/// Path fragments used by known renderer/proxy services.
static WRAPPER_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)pdfrenderer|pdf\.svc|htmltopdf|html2pdf|render.*pdf|pdf.*render|webshot|screenshot|snapshot|proxy\.php|fetch\.php",
    )
    .expect("wrapper pattern is a valid regex")
});

/// Query parameters that commonly hold the inner URL, highest priority first.
const URL_PARAM_NAMES: [&str; 6] = ["url", "source", "target", "uri", "link", "src"];

/// Return the URL a wrapper points at, or `url` unchanged.
///
/// Nested wrappers are unwrapped until a fixpoint, so
/// `resolve(&resolve(u)) == resolve(u)`. Never fails: input that does not
/// parse comes back as given.
pub fn resolve(url: &str) -> String {
    let mut current = url.to_string();
    // Each step yields a decoded substring of the query, strictly shorter
    // than the URL it came from, so the loop terminates.
    while let Some(inner) = unwrap_once(&current) {
        if inner.len() >= current.len() {
            break;
        }
        tracing::debug!(outer = %current, inner = %inner, "Unwrapped source URL");
        current = inner;
    }
    current
}

/// Single unwrapping step; `None` when `url` is not a wrapper.
fn unwrap_once(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();

    let looks_like_wrapper = WRAPPER_PATTERNS.is_match(path);
    let service_style = path.split('/').filter(|s| !s.is_empty()).count() >= 2;
    if !looks_like_wrapper && !service_style {
        return None;
    }

    URL_PARAM_NAMES.iter().find_map(|name| {
        // query_pairs already percent-decodes once; a second pass handles
        // inner URLs that were encoded twice.
        let value = parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())?;
        let candidate = urlencoding::decode(&value)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(value);
        is_absolute_http(&candidate).then_some(candidate)
    })
}

fn is_absolute_http(candidate: &str) -> bool {
    candidate.starts_with("http://") || candidate.starts_with("https://")
}
