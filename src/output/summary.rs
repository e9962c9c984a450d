//! Summary types
//!
//! [`CrawlSummary`] is what the controller reports when a crawl closes;
//! [`CatalogReport`] is what the markdown export renders from the database.

use crate::output::stats::{CatalogStatistics, CrawlStats};
use crate::storage::{RunRecord, WriterReport};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Final numbers of one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Why the crawl closed ("finished", "shutdown" or "error")
    pub reason: String,
    pub run_id: i64,

    pub items_scraped: u64,
    pub items_dropped: u64,
    pub items_written: u64,
    pub write_failures: u64,

    pub requests_sent: u64,
    pub requests_failed: u64,
    pub entries_skipped: u64,
    pub empty_listings: u64,
    pub offsite_filtered: u64,

    pub duration: Duration,
}

impl CrawlSummary {
    /// Snapshots the live counters at close
    pub fn from_stats(
        reason: &str,
        run_id: i64,
        stats: &CrawlStats,
        writer: WriterReport,
        duration: Duration,
    ) -> Self {
        Self {
            reason: reason.to_string(),
            run_id,
            items_scraped: stats.items_scraped(),
            items_dropped: stats.items_dropped(),
            items_written: writer.written,
            write_failures: writer.failed,
            requests_sent: stats.requests_sent(),
            requests_failed: stats.requests_failed(),
            entries_skipped: stats.entries_skipped(),
            empty_listings: stats.empty_listings(),
            offsite_filtered: stats.offsite_filtered(),
            duration,
        }
    }

    /// Emits the close summary through tracing
    pub fn log(&self) {
        tracing::info!(
            "Spider closed: {}. Total items scraped: {}",
            self.reason,
            self.items_scraped
        );
        tracing::info!(
            "Run {}: {} requests ({} failed), {} entries skipped, {} empty listings, \
             {} items dropped, {} offsite links filtered, {:.1}s",
            self.run_id,
            self.requests_sent,
            self.requests_failed,
            self.entries_skipped,
            self.empty_listings,
            self.items_dropped,
            self.offsite_filtered,
            self.duration.as_secs_f64()
        );
        if self.write_failures > 0 {
            tracing::warn!(
                "{} of {} items could not be stored",
                self.write_failures,
                self.items_scraped
            );
        }
    }
}

/// Everything the markdown export shows
#[derive(Debug, Clone)]
pub struct CatalogReport {
    pub run: Option<RunRecord>,
    pub duration_seconds: Option<u64>,
    pub statistics: CatalogStatistics,
}
