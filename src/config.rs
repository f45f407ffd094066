//! Configuration types for pkgcheck

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

use crate::error::{Error, Result};

/// Remote endpoints consumed by the source fetchers
///
/// Base URLs are configuration, not behavior: the core never reads them from
/// the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Bulk directory snapshot (GET, `{ "libraries": [...] }`)
    #[serde(default = "default_directory_data_url")]
    pub directory_data_url: String,

    /// Newline-delimited release tag list (GET)
    #[serde(default = "default_release_list_url")]
    pub release_list_url: String,

    /// Batched architecture check (POST `{ "packages": [...] }`)
    #[serde(default = "default_architecture_check_url")]
    pub architecture_check_url: String,

    /// Per-package directory search (GET `?search=<name>`)
    #[serde(default = "default_directory_search_url")]
    pub directory_search_url: String,

    /// Registry package page prefix; the bare name is appended
    #[serde(default = "default_package_page_base")]
    pub package_page_base: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory_data_url: default_directory_data_url(),
            release_list_url: default_release_list_url(),
            architecture_check_url: default_architecture_check_url(),
            directory_search_url: default_directory_search_url(),
            package_page_base: default_package_page_base(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    /// Point every source at one base URL (`<base>/data.json`, `<base>/releases`,
    /// `<base>/check`, `<base>/libraries`, `<base>/package/`)
    ///
    /// Used for self-hosted mirrors and mock servers.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            directory_data_url: format!("{base}/data.json"),
            release_list_url: format!("{base}/releases"),
            architecture_check_url: format!("{base}/check"),
            directory_search_url: format!("{base}/libraries"),
            package_page_base: format!("{base}/package/"),
            user_agent: default_user_agent(),
        }
    }

    /// Registry page for a bare package name
    pub fn package_page(&self, name: &str) -> String {
        format!("{}{}", self.package_page_base, name)
    }
}

/// HTTP client behavior shared by all fetchers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total timeout for a single request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Connect timeout for a single request (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Dispatch limits for the per-package directory search
///
/// The upstream search endpoint is rate limited. Consecutive searches start at
/// least `min_interval` apart, and at most `max_concurrent` are in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum spacing between consecutive search dispatches (default: 100 ms)
    #[serde(default = "default_search_interval", with = "duration_millis_serde")]
    pub min_interval: Duration,

    /// Maximum searches in flight at once (default: 1, strictly sequential)
    #[serde(default = "default_search_concurrency")]
    pub max_concurrent: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_interval: default_search_interval(),
            max_concurrent: default_search_concurrency(),
        }
    }
}

/// Retry configuration for transient failures of the bulk fetches
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }
}

/// Export file naming and document title
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Filename prefix, `<prefix>-<timestamp>.<ext>` (default: "package-report")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Heading of the formatted document
    #[serde(default = "default_document_title")]
    pub document_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            document_title: default_document_title(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser clients (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" allows any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Largest identifier list accepted by POST /check (default: 500)
    #[serde(default = "default_max_packages")]
    pub max_packages_per_request: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_packages_per_request: default_max_packages(),
        }
    }
}

/// Main configuration for [`PackageChecker`](crate::PackageChecker)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints
    #[serde(default)]
    pub sources: SourceConfig,

    /// HTTP client timeouts
    #[serde(default)]
    pub http: HttpConfig,

    /// Directory search dispatch limits
    #[serde(default)]
    pub search: SearchConfig,

    /// Retry policy for the bulk fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Export naming
    #[serde(default)]
    pub export: ExportConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Runtime packages skipped when extracting identifiers from a manifest
    #[serde(default = "default_ignored_packages")]
    pub ignored_packages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            http: HttpConfig::default(),
            search: SearchConfig::default(),
            retry: RetryConfig::default(),
            export: ExportConfig::default(),
            api: ApiConfig::default(),
            ignored_packages: default_ignored_packages(),
        }
    }
}

impl Config {
    /// Check the configuration for values the checker cannot work with
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("sources.directory_data_url", &self.sources.directory_data_url),
            ("sources.release_list_url", &self.sources.release_list_url),
            (
                "sources.architecture_check_url",
                &self.sources.architecture_check_url,
            ),
            (
                "sources.directory_search_url",
                &self.sources.directory_search_url,
            ),
        ];
        for (key, value) in urls {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("invalid URL {value:?}: {e}"),
                key: Some(key.to_string()),
            })?;
        }

        if self.http.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request timeout must be greater than zero".to_string(),
                key: Some("http.request_timeout".to_string()),
            });
        }

        if self.search.max_concurrent == 0 {
            return Err(Error::Config {
                message: "at least one concurrent search is required".to_string(),
                key: Some("search.max_concurrent".to_string()),
            });
        }

        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: format!("backoff multiplier must be a finite number >= 1, got {multiplier}"),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }

        if self.export.file_prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "export file prefix cannot be empty".to_string(),
                key: Some("export.file_prefix".to_string()),
            });
        }

        Ok(())
    }
}

fn default_directory_data_url() -> String {
    "https://raw.githubusercontent.com/react-native-community/directory/main/assets/data.json"
        .to_string()
}

fn default_release_list_url() -> String {
    "https://raw.githubusercontent.com/react-native-community/rn-diff-purge/master/RELEASES"
        .to_string()
}

fn default_architecture_check_url() -> String {
    "https://reactnative.directory/api/libraries/check".to_string()
}

fn default_directory_search_url() -> String {
    "https://reactnative.directory/api/libraries".to_string()
}

fn default_package_page_base() -> String {
    "https://www.npmjs.com/package/".to_string()
}

fn default_user_agent() -> String {
    format!("pkgcheck/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_search_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_search_concurrency() -> usize {
    1
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_file_prefix() -> String {
    "package-report".to_string()
}

fn default_document_title() -> String {
    "Package Compatibility Report".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_packages() -> usize {
    500
}

fn default_ignored_packages() -> Vec<String> {
    [
        "react",
        "react-native",
        "react-dom",
        "@react-native",
        "@react-native-community",
        "@babel",
        "metro",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
