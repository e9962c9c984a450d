use serde::Deserialize;

/// Main configuration structure for Parts-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    #[serde(rename = "concurrent-requests", default = "default_concurrent_requests")]
    pub concurrent_requests: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Lower bound of the random delay before each start request (milliseconds)
    #[serde(rename = "start-delay-min", default = "default_start_delay_min")]
    pub start_delay_min: u64,

    /// Upper bound of the random delay before each start request (milliseconds)
    #[serde(rename = "start-delay-max", default = "default_start_delay_max")]
    pub start_delay_max: u64,
}

fn default_concurrent_requests() -> u32 {
    10
}

fn default_start_delay_min() -> u64 {
    1000
}

fn default_start_delay_max() -> u64 {
    3000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
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
}

/// Where the catalog lives
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Root pages listing every make
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Domain patterns follow-up requests must stay on (e.g. "example.com" or "*.example.com")
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,
}

/// CSS selectors describing the catalog markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Entries on the root page
    pub makes: String,

    /// Entries on a make page
    pub categories: String,

    /// Entries on a category page
    pub models: String,

    /// Entries on a model page
    pub parts: String,

    /// Link inside an entry (text and href)
    pub link: String,

    /// Type label inside a part entry
    #[serde(rename = "part-type")]
    pub part_type: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            makes: "div.allmakes li".to_string(),
            categories: "div.allcategories li".to_string(),
            models: "div.allmodels li".to_string(),
            parts: "div.allparts li".to_string(),
            link: "a".to_string(),
            part_type: "a span".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}
