//! Client configuration values.

use std::path::PathBuf;

pub const BASE_URL_ENV: &str = "CATALOG_API_BASE_URL";
pub const SITE_ID_ENV: &str = "CATALOG_SITE_ID";
pub const TIMEOUT_ENV: &str = "CATALOG_HTTP_TIMEOUT_SECS";
pub const PAGE_SIZE_ENV: &str = "CATALOG_PAGE_SIZE";
pub const TOKEN_FILE_ENV: &str = "CATALOG_TOKEN_FILE";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000/api/v1`. Stored without a trailing slash.
    pub base_url: String,
    /// Tenant every catalog record belongs to. Checked lazily, per call.
    pub site_id: Option<String>,
    pub timeout_secs: u64,
    pub default_page_size: u32,
    /// When set, tokens are persisted to this JSON file.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_page_size: DEFAULT_PAGE_SIZE,
            token_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..ClientConfig::default()
        }
    }

    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }
}
