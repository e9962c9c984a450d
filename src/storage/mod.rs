//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking
//! - Product upserts, queries and deletes
//! - The background writer used during a crawl

mod schema;
mod sqlite;
mod traits;
mod writer;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use writer::{spawn_writer, WriterHandle, WriterReport};

use crate::CrawlError;
use serde::Serialize;
use std::path::Path;

/// Page size used when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a query may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CrawlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub close_reason: Option<String>,
    pub items_scraped: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A product row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredProduct {
    pub id: i64,
    pub make: String,
    pub category: String,
    pub model: String,
    pub part_type: Option<String>,
    pub part_number: String,
    pub scraped_at: String,
}

/// Equality filters for product queries; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub make: Option<String>,
    pub category: Option<String>,
    pub model: Option<String>,
    pub part_number: Option<String>,
    pub part_type: Option<String>,
}

impl ProductFilter {
    /// Column/value pairs of the filters that are set
    pub(crate) fn conditions(&self) -> Vec<(&'static str, &str)> {
        [
            ("make", &self.make),
            ("category", &self.category),
            ("model", &self.model),
            ("part_number", &self.part_number),
            ("part_type", &self.part_type),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }
}

/// A one-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    size: u32,
}

impl Pagination {
    /// Creates a page request
    ///
    /// # Errors
    ///
    /// `page` must be at least 1 and `size` between 1 and [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, size: u32) -> StorageResult<Self> {
        if page < 1 {
            return Err(StorageError::InvalidPagination(format!(
                "page must be >= 1, got {}",
                page
            )));
        }
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(StorageError::InvalidPagination(format!(
                "size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, size
            )));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<StoredProduct>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u64,
}

/// Outcome of a delete command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResponse {
    pub deleted_count: u64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Interrupted,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::new(1, 1).is_ok());
        assert!(Pagination::new(3, MAX_PAGE_SIZE).is_ok());

        assert!(Pagination::new(0, 10).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(1, MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_pagination_offset() {
        assert_eq!(Pagination::default().offset(), 0);
        assert_eq!(Pagination::new(3, 20).unwrap().offset(), 40);
    }

    #[test]
    fn test_filter_conditions_skip_unset_fields() {
        let filter = ProductFilter {
            make: Some("Acme".to_string()),
            part_type: Some("oem".to_string()),
            ..ProductFilter::default()
        };

        assert_eq!(
            filter.conditions(),
            vec![("make", "Acme"), ("part_type", "oem")]
        );
        assert!(ProductFilter::default().conditions().is_empty());
    }
}
