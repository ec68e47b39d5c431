use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Doc-Harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub rules: RulesConfig,
    #[serde(rename = "literal")]
    pub literals: Vec<LiteralEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
            rules: RulesConfig::default(),
            literals: vec![LiteralEntry::boston()],
        }
    }
}

impl Config {
    /// Returns the literal artifact configured for a label, if any
    ///
    /// Labels are compared case-insensitively.
    pub fn literal_for(&self, label: &str) -> Option<&LiteralEntry> {
        self.literals
            .iter()
            .find(|entry| entry.label.eq_ignore_ascii_case(label))
    }
}

/// Which fetcher implementation backs link discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP GET, no script execution
    #[default]
    Http,
    /// Headless Chromium session (requires the `browser` feature)
    Browser,
}

/// Crawler behavior configuration
///
/// All delays are in milliseconds. Ranges are inclusive and sampled
/// uniformly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub fetcher: FetcherKind,

    /// Lower bound of the per-domain request spacing
    #[serde(rename = "rate-limit-min-ms")]
    pub rate_limit_min_ms: u64,

    /// Upper bound of the per-domain request spacing
    #[serde(rename = "rate-limit-max-ms")]
    pub rate_limit_max_ms: u64,

    /// Attempts an entry gets before it is recorded as exhausted
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "retry-backoff-min-ms")]
    pub retry_backoff_min_ms: u64,

    #[serde(rename = "retry-backoff-max-ms")]
    pub retry_backoff_max_ms: u64,

    /// Attempts for a single document download
    #[serde(rename = "download-attempts")]
    pub download_attempts: u32,

    #[serde(rename = "download-backoff-min-ms")]
    pub download_backoff_min_ms: u64,

    #[serde(rename = "download-backoff-max-ms")]
    pub download_backoff_max_ms: u64,

    /// Link count above which only document links are kept
    #[serde(rename = "link-volume-threshold")]
    pub link_volume_threshold: usize,

    /// Wait before re-checking a "checking your browser" interstitial
    #[serde(rename = "challenge-grace-ms")]
    pub challenge_grace_ms: u64,

    /// Network timeout for plain HTTP requests
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on a browser page load
    #[serde(rename = "page-load-timeout-secs")]
    pub page_load_timeout_secs: u64,

    /// Rotate the fetcher's user agent every N page fetches (0 disables)
    #[serde(rename = "user-agent-rotation")]
    pub user_agent_rotation: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherKind::Http,
            rate_limit_min_ms: 2000,
            rate_limit_max_ms: 5000,
            max_retries: 2,
            retry_backoff_min_ms: 5000,
            retry_backoff_max_ms: 10000,
            download_attempts: 2,
            download_backoff_min_ms: 2000,
            download_backoff_max_ms: 5000,
            link_volume_threshold: 10,
            challenge_grace_ms: 5000,
            request_timeout_secs: 10,
            page_load_timeout_secs: 30,
            user_agent_rotation: 5,
        }
    }
}

impl CrawlerConfig {
    pub fn rate_limit_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.rate_limit_min_ms),
            Duration::from_millis(self.rate_limit_max_ms),
        )
    }

    pub fn retry_backoff_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.retry_backoff_min_ms),
            Duration::from_millis(self.retry_backoff_max_ms),
        )
    }

    pub fn download_backoff_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.download_backoff_min_ms),
            Duration::from_millis(self.download_backoff_max_ms),
        )
    }

    pub fn challenge_grace(&self) -> Duration {
        Duration::from_millis(self.challenge_grace_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// User agents drawn from when the fetcher rotates its identity
    #[serde(rename = "rotation-pool")]
    pub rotation_pool: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DocHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            rotation_pool: Vec::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the default user agent string
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Queue input configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Two-column `label,url` file
    #[serde(rename = "urls-path")]
    pub urls_path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            urls_path: "urls.csv".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; each label gets a sub-directory
    #[serde(rename = "base-dir")]
    pub base_dir: String,

    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    #[serde(rename = "outliers-path")]
    pub outliers_path: String,

    #[serde(rename = "failures-path")]
    pub failures_path: String,

    /// Markdown run report, skipped when unset
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: "downloaded_content".to_string(),
            checkpoint_path: "scraper_state.json".to_string(),
            outliers_path: "outliers.csv".to_string(),
            failures_path: "failed_urls.csv".to_string(),
            summary_path: None,
        }
    }
}

/// Site-specific classification and extraction rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Domain whose single canonical page already is the full document
    #[serde(rename = "document-domain")]
    pub document_domain: Option<String>,

    /// Path fragments that mark a link as a document download
    #[serde(rename = "document-path-markers")]
    pub document_path_markers: Vec<String>,

    /// Container class names searched for main content, in priority order
    #[serde(rename = "content-classes")]
    pub content_classes: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            document_domain: Some("ecode360.com".to_string()),
            document_path_markers: vec!["DocumentCenter".to_string()],
            content_classes: vec![
                "content".to_string(),
                "main-content".to_string(),
                "body".to_string(),
                "post-content".to_string(),
            ],
        }
    }
}

/// A label that is satisfied by writing a fixed artifact instead of fetching
#[derive(Debug, Clone, Deserialize)]
pub struct LiteralEntry {
    pub label: String,

    #[serde(rename = "file-name")]
    pub file_name: String,

    pub content: String,
}

impl LiteralEntry {
    /// Boston's code is recorded as a pointer to where it is published
    pub fn boston() -> Self {
        Self {
            label: "Boston".to_string(),
            file_name: "boston_code.txt".to_string(),
            content: "https://library.municode.com/ma/boston/codes/code_of_ordinances"
                .to_string(),
        }
    }
}
