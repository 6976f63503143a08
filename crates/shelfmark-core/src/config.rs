//! Configuration module
//!
//! Credentials and fetch policy for the Zotero client and the ingestion
//! pipeline. Built once at process start and handed to the components that
//! need it; nothing reads process-wide state after construction.

use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_API_URL: &str = "https://api.zotero.org";
const FETCH_TIMEOUT_SECS: u64 = 60;

/// User-agent sent on every content fetch.
pub fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; Shelfmark/{})",
        env!("CARGO_PKG_VERSION")
    )
}

/// Which kind of Zotero library the credentials address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LibraryType {
    #[default]
    User,
    Group,
}

impl FromStr for LibraryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "users" => Ok(LibraryType::User),
            "group" | "groups" => Ok(LibraryType::Group),
            other => Err(anyhow::anyhow!(
                "ZOTERO_LIBRARY_TYPE must be 'user' or 'group', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryType::User => write!(f, "user"),
            LibraryType::Group => write!(f, "group"),
        }
    }
}

#[derive(Clone)]
pub struct ZoteroConfig {
    pub api_key: String,
    pub library_id: String,
    pub library_type: LibraryType,
    pub api_base_url: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

// The API key never shows up in logs.
impl fmt::Debug for ZoteroConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoteroConfig")
            .field("api_key", &"<redacted>")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .field("api_base_url", &self.api_base_url)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ZoteroConfig {
    /// Config with default base URL, timeout and user agent.
    pub fn new(
        api_key: impl Into<String>,
        library_id: impl Into<String>,
        library_type: LibraryType,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            library_id: library_id.into(),
            library_type,
            api_base_url: DEFAULT_API_URL.to_string(),
            fetch_timeout_secs: FETCH_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    /// Point the client at another API host (tests, self-hosted mirrors).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_key = env::var("ZOTERO_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "ZOTERO_API_KEY is not set. Create a key at https://www.zotero.org/settings/keys"
                )
            })?;

        let library_id = env::var("ZOTERO_LIBRARY_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("ZOTERO_LIBRARY_ID is not set"))?;

        let library_type = env::var("ZOTERO_LIBRARY_TYPE")
            .unwrap_or_else(|_| "user".to_string())
            .parse::<LibraryType>()?;

        let config = ZoteroConfig {
            api_key: api_key.trim().to_string(),
            library_id: library_id.trim().to_string(),
            library_type,
            api_base_url: env::var("ZOTERO_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FETCH_TIMEOUT_SECS must be a valid number"))?,
            user_agent: env::var("FETCH_USER_AGENT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("ZOTERO_API_KEY must not be empty"));
        }

        if self.library_id.is_empty() || !self.library_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow::anyhow!(
                "ZOTERO_LIBRARY_ID must be the numeric user or group id"
            ));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "ZOTERO_API_URL must start with http:// or https://"
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("FETCH_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }

    /// Path prefix addressing the library: `/users/{id}` or `/groups/{id}`.
    pub fn library_prefix(&self) -> String {
        match self.library_type {
            LibraryType::User => format!("/users/{}", self.library_id),
            LibraryType::Group => format!("/groups/{}", self.library_id),
        }
    }
}
