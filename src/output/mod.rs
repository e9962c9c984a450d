//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Live crawl counters and the summary emitted when a crawl closes
//! - Catalog statistics read back from the database
//! - The markdown catalog report

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CatalogStatistics, CrawlStats};
pub use summary::{CatalogReport, CrawlSummary, OutputError, OutputResult};

use crate::storage::Storage;
use crate::CrawlError;

/// Builds the catalog report from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
///
/// # Returns
///
/// * `Ok(CatalogReport)` - Successfully generated report
/// * `Err(CrawlError)` - Failed to query storage
pub fn generate_summary(storage: &dyn Storage) -> Result<CatalogReport, CrawlError> {
    let statistics = stats::load_statistics(storage)?;
    let run = statistics.latest_run.clone();

    let duration_seconds = run.as_ref().and_then(|run| {
        let started = run.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
        let finished = run
            .finished_at
            .as_ref()?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .ok()?;
        Some((finished - started).num_seconds().max(0) as u64)
    });

    Ok(CatalogReport {
        run,
        duration_seconds,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RunStatus, SqliteStorage};

    #[test]
    fn test_generate_summary_for_empty_database() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let report = generate_summary(&storage).unwrap();

        assert!(report.run.is_none());
        assert!(report.duration_seconds.is_none());
        assert_eq!(report.statistics.total_products, 0);
    }

    #[test]
    fn test_generate_summary_includes_finished_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        storage
            .complete_run(run_id, RunStatus::Completed, "finished", 0)
            .unwrap();

        let report = generate_summary(&storage).unwrap();

        assert_eq!(report.run.as_ref().map(|r| r.id), Some(run_id));
        assert!(report.duration_seconds.is_some());
    }
}
