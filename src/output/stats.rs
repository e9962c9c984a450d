//! Crawl statistics
//!
//! Two views of the same crawl: [`CrawlStats`] counts events live while the
//! crawl runs, and [`CatalogStatistics`] is read back from the database
//! afterwards.

use crate::pipeline::StageOutput;
use crate::storage::{RunRecord, Storage};
use crate::CrawlError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live crawl counters, shared by every branch task
///
/// All counters are plain atomics; no increment is ever lost when branch
/// tasks finish at the same time.
#[derive(Debug, Default)]
pub struct CrawlStats {
    items_scraped: AtomicU64,
    items_dropped: AtomicU64,
    requests_sent: AtomicU64,
    requests_failed: AtomicU64,
    entries_skipped: AtomicU64,
    empty_listings: AtomicU64,
    offsite_filtered: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one emitted record and returns the new total
    pub fn record_item(&self) -> u64 {
        self.items_scraped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_request(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offsite(&self) {
        self.offsite_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Folds the skip, drop and empty-listing counts of one handler run in
    pub fn record_stage_output(&self, output: &StageOutput) {
        self.entries_skipped
            .fetch_add(output.skipped as u64, Ordering::Relaxed);
        self.items_dropped
            .fetch_add(output.dropped as u64, Ordering::Relaxed);
        if output.empty_listing {
            self.empty_listings.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn items_scraped(&self) -> u64 {
        self.items_scraped.load(Ordering::Relaxed)
    }

    pub fn items_dropped(&self) -> u64 {
        self.items_dropped.load(Ordering::Relaxed)
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    pub fn empty_listings(&self) -> u64 {
        self.empty_listings.load(Ordering::Relaxed)
    }

    pub fn offsite_filtered(&self) -> u64 {
        self.offsite_filtered.load(Ordering::Relaxed)
    }
}

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of stored products
    pub total_products: u64,

    /// Product counts per make, largest first
    pub products_by_make: Vec<(String, u64)>,

    /// Product counts per category, largest first
    pub products_by_category: Vec<(String, u64)>,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CatalogStatistics, CrawlError> {
    Ok(CatalogStatistics {
        total_products: storage.count_products()?,
        products_by_make: storage.count_by_make()?,
        products_by_category: storage.count_by_category()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total products: {}", stats.total_products);
    println!("  Makes: {}", stats.products_by_make.len());
    println!("  Categories: {}", stats.products_by_category.len());
    println!();

    print_breakdown("Products by Make", &stats.products_by_make, stats.total_products);
    print_breakdown(
        "Products by Category",
        &stats.products_by_category,
        stats.total_products,
    );

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Run ID: {}", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", run.status.to_db_string());
            if let Some(reason) = &run.close_reason {
                println!("  Close reason: {}", reason);
            }
            println!("  Items scraped: {}", run.items_scraped);
        }
        None => println!("No crawl runs recorded yet."),
    }
}

fn print_breakdown(title: &str, counts: &[(String, u64)], total: u64) {
    if counts.is_empty() {
        return;
    }

    println!("{}:", title);
    for (name, count) in counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProductRecord;
    use crate::storage::{RunStatus, SqliteStorage};
    use std::sync::Arc;

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let stats = Arc::new(CrawlStats::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_item();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.items_scraped(), 8000);
    }

    #[test]
    fn test_record_stage_output() {
        let stats = CrawlStats::new();
        stats.record_stage_output(&StageOutput {
            skipped: 2,
            dropped: 1,
            ..StageOutput::default()
        });
        stats.record_stage_output(&StageOutput {
            empty_listing: true,
            ..StageOutput::default()
        });

        assert_eq!(stats.entries_skipped(), 2);
        assert_eq!(stats.items_dropped(), 1);
        assert_eq!(stats.empty_listings(), 1);
        assert_eq!(stats.items_scraped(), 0);
    }

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        for (make, part_number) in [("Acme", "1"), ("Acme", "2"), ("Bolt", "3")] {
            storage
                .upsert_product(&ProductRecord {
                    make: make.to_string(),
                    category: "brakes".to_string(),
                    model: "X".to_string(),
                    part_type: None,
                    part_number: part_number.to_string(),
                })
                .unwrap();
        }
        storage
            .complete_run(run_id, RunStatus::Completed, "finished", 3)
            .unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.products_by_make[0], ("Acme".to_string(), 2));
        assert_eq!(stats.products_by_category.len(), 1);
        assert_eq!(stats.latest_run.unwrap().items_scraped, 3);
    }
}
