use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Accord-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
    pub site: SiteConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of item URLs collected per category
    #[serde(rename = "per-category-cap")]
    pub per_category_cap: u32,

    /// Number of fetches allowed in flight at once (1 = serial)
    pub concurrency: u32,

    /// Base delay between requests (milliseconds), also the adaptive floor
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound for the adaptive delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Apply +/-50% random jitter to every delay
    pub jitter: bool,

    /// Adapt the delay to observed response latency
    pub adaptive: bool,

    /// Total request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Log a progress line every N processed pages (0 disables)
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            per_category_cap: 100,
            concurrency: 2,
            base_delay_ms: 2000,
            max_delay_ms: 10_000,
            jitter: true,
            adaptive: true,
            request_timeout_secs: 30,
            progress_interval: 10,
        }
    }
}

/// Client identity pool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// User-Agent strings; one is picked at random for each request
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
            ],
        }
    }
}

/// Record store location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the database file, or `:memory:`
    pub connection: String,

    /// Database name; the file is `<connection>/<database>.sqlite3`
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection: "./data".to_string(),
            database: "accords".to_string(),
        }
    }
}

impl StoreConfig {
    /// Returns true when the store should live in memory only
    pub fn is_in_memory(&self) -> bool {
        self.connection == ":memory:"
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.connection).join(format!("{}.sqlite3", self.database))
    }
}

/// Upstream site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Category index page (the designer list)
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// Path prefix of category page links
    #[serde(rename = "category-prefix")]
    pub category_prefix: String,

    /// Path fragment identifying item page links
    #[serde(rename = "item-marker")]
    pub item_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_url: "https://www.fragrantica.com/designers/".to_string(),
            category_prefix: "/designers/".to_string(),
            item_marker: "/perfume/".to_string(),
        }
    }
}
