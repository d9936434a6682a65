use serde::Deserialize;

/// Main configuration structure for tropemap
///
/// Every section and field carries a default so the binary can run without
/// a configuration file at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Host every crawled URL is anchored to
    #[serde(default = "default_host")]
    pub host: String,

    /// URL scheme; production crawls are https, tests point at plain-http
    /// mock servers
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Global ceiling on simultaneously active workers across all stages
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Number of paginated listing-index pages to seed a fresh crawl with
    #[serde(rename = "listing-pages", default = "default_listing_pages")]
    pub listing_pages: u32,

    /// Listing stage runs only while namespace queue < ratio * listing queue
    #[serde(rename = "listing-ratio", default = "default_listing_ratio")]
    pub listing_ratio: usize,

    /// Namespace stage runs only while page queue < ratio * namespace queue
    #[serde(rename = "namespace-ratio", default = "default_namespace_ratio")]
    pub namespace_ratio: usize,

    /// First rate-limit backoff delay (milliseconds)
    #[serde(rename = "rate-limit-base-ms", default = "default_rate_limit_base")]
    pub rate_limit_base_ms: u64,

    /// Ceiling on a single rate-limit backoff delay (milliseconds)
    #[serde(rename = "rate-limit-max-ms", default = "default_rate_limit_max")]
    pub rate_limit_max_ms: u64,

    /// How many times a failed persistence task is re-queued before it is
    /// recorded as a fault and dropped
    #[serde(rename = "persist-retry-limit", default = "default_persist_retry_limit")]
    pub persist_retry_limit: u32,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path the fault log is flushed to on interrupt
    #[serde(rename = "fault-log-path", default = "default_fault_log_path")]
    pub fault_log_path: String,
}

fn default_host() -> String {
    "tvtropes.org".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_listing_pages() -> u32 {
    37
}

fn default_listing_ratio() -> usize {
    100
}

fn default_namespace_ratio() -> usize {
    10
}

fn default_rate_limit_base() -> u64 {
    60_000
}

fn default_rate_limit_max() -> u64 {
    600_000
}

fn default_persist_retry_limit() -> u32 {
    5
}

fn default_user_agent() -> String {
    format!("tropemap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_database_path() -> String {
    "tropemap.db".to_string()
}

fn default_fault_log_path() -> String {
    "crawl-faults.log".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            scheme: default_scheme(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            listing_pages: default_listing_pages(),
            listing_ratio: default_listing_ratio(),
            namespace_ratio: default_namespace_ratio(),
            rate_limit_base_ms: default_rate_limit_base(),
            rate_limit_max_ms: default_rate_limit_max(),
            persist_retry_limit: default_persist_retry_limit(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            fault_log_path: default_fault_log_path(),
        }
    }
}
