//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::pipeline::ProductRecord;
use crate::storage::{
    DeleteResponse, Pagination, ProductFilter, ProductPage, RunRecord, RunStatus, StoredProduct,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler and
/// the query commands of the binary.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status, close reason and item count
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        reason: &str,
        items_scraped: u64,
    ) -> StorageResult<()>;

    // ===== Products =====

    /// Inserts a product or refreshes the existing row for the same branch and part number
    ///
    /// # Returns
    ///
    /// The product ID
    fn upsert_product(&mut self, record: &ProductRecord) -> StorageResult<i64>;

    /// Gets a product by ID
    fn get_product(&self, product_id: i64) -> StorageResult<StoredProduct>;

    /// Lists products matching `filter`, one page at a time
    fn query_products(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> StorageResult<ProductPage>;

    /// Deletes one product by ID
    fn delete_product(&mut self, product_id: i64) -> StorageResult<DeleteResponse>;

    /// Deletes every product with the given part number
    fn delete_products_by_part_number(&mut self, part_number: &str)
        -> StorageResult<DeleteResponse>;

    // ===== Statistics =====

    /// Gets total product count
    fn count_products(&self) -> StorageResult<u64>;

    /// Product counts per make, largest first
    fn count_by_make(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Product counts per category, largest first
    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>>;
}
