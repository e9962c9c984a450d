//! Crawler module for catalog fetching and orchestration
//!
//! This module contains the crawl engine around the stage pipeline:
//! - HTTP fetching and error classification
//! - Request scheduling and concurrency limiting
//! - Overall crawl coordination (the crawl controller)

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{Coordinator, CLOSE_ERROR, CLOSE_FINISHED, CLOSE_SHUTDOWN};
pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use scheduler::{ScheduledFetch, Scheduler};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the database and record a new run
/// 2. Build the HTTP client
/// 3. Issue the start requests and walk the catalog tree
/// 4. Store every validated product
/// 5. Close the run and return its summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(CrawlError)` - Crawl failed
///
/// # Example
///
/// ```no_run
/// use parts_crawler::config::load_config_with_hash;
/// use parts_crawler::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let summary = crawl(config, &hash).await?;
/// println!("{} items scraped", summary.items_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, config_hash: &str) -> Result<CrawlSummary> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run().await
}
