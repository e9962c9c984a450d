//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::pipeline::ProductRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    DeleteResponse, Pagination, ProductFilter, ProductPage, RunRecord, RunStatus, StoredProduct,
};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, close_reason, items_scraped";

const PRODUCT_COLUMNS: &str = "id, make, category, model, part_type, part_number, scraped_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        close_reason: row.get(5)?,
        items_scraped: row.get::<_, i64>(6)? as u64,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<StoredProduct> {
    Ok(StoredProduct {
        id: row.get(0)?,
        make: row.get(1)?,
        category: row.get(2)?,
        model: row.get(3)?,
        part_type: row.get(4)?,
        part_number: row.get(5)?,
        scraped_at: row.get(6)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        reason: &str,
        items_scraped: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, close_reason = ?3, items_scraped = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                reason,
                items_scraped as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Products =====

    fn upsert_product(&mut self, record: &ProductRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO products (make, category, model, part_type, part_number, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(make, category, model, part_number) DO UPDATE SET
                part_type = excluded.part_type,
                scraped_at = excluded.scraped_at
             RETURNING id",
            params![
                record.make,
                record.category,
                record.model,
                record.part_type,
                record.part_number,
                now
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn get_product(&self, product_id: i64) -> StorageResult<StoredProduct> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
                params![product_id],
                product_from_row,
            )
            .optional()?
            .ok_or(StorageError::ProductNotFound(product_id))
    }

    fn query_products(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> StorageResult<ProductPage> {
        let conditions = filter.conditions();
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            let clauses: Vec<String> = conditions
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect();
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let values: Vec<&str> = conditions.iter().map(|(_, value)| *value).collect();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM products{}", where_clause),
            params_from_iter(&values),
            |row| row.get(0),
        )?;

        let query = format!(
            "SELECT {} FROM products{} ORDER BY id LIMIT {} OFFSET {}",
            PRODUCT_COLUMNS,
            where_clause,
            pagination.size(),
            pagination.offset()
        );
        let mut stmt = self.conn.prepare(&query)?;
        let items = stmt
            .query_map(params_from_iter(&values), product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let total = total as u64;
        let size = u64::from(pagination.size());

        Ok(ProductPage {
            items,
            total,
            page: pagination.page(),
            size: pagination.size(),
            pages: (total + size - 1) / size,
        })
    }

    fn delete_product(&mut self, product_id: i64) -> StorageResult<DeleteResponse> {
        let deleted = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![product_id])?;

        let message = if deleted == 0 {
            format!("No product found with id {}", product_id)
        } else {
            format!("Deleted product {}", product_id)
        };

        Ok(DeleteResponse {
            deleted_count: deleted as u64,
            message,
        })
    }

    fn delete_products_by_part_number(
        &mut self,
        part_number: &str,
    ) -> StorageResult<DeleteResponse> {
        let deleted = self.conn.execute(
            "DELETE FROM products WHERE part_number = ?1",
            params![part_number],
        )?;

        Ok(DeleteResponse {
            deleted_count: deleted as u64,
            message: format!(
                "Deleted {} product(s) with part number '{}'",
                deleted, part_number
            ),
        })
    }

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_make(&self) -> StorageResult<Vec<(String, u64)>> {
        count_grouped(&self.conn, "make")
    }

    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        count_grouped(&self.conn, "category")
    }
}

/// Product counts grouped by one column, largest group first
fn count_grouped(conn: &Connection, column: &str) -> StorageResult<Vec<(String, u64)>> {
    let query = format!(
        "SELECT {col}, COUNT(*) AS count FROM products GROUP BY {col} ORDER BY count DESC, {col}",
        col = column
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(make: &str, category: &str, model: &str, part_number: &str) -> ProductRecord {
        ProductRecord {
            make: make.to_string(),
            category: category.to_string(),
            model: model.to_string(),
            part_type: None,
            part_number: part_number.to_string(),
        }
    }

    fn seeded() -> SqliteStorage {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_product(&record("Acme", "brakes", "Model X", "100"))
            .unwrap();
        storage
            .upsert_product(&record("Acme", "brakes", "Model Y", "200"))
            .unwrap();
        storage
            .upsert_product(&record("Acme", "engine", "Model X", "300"))
            .unwrap();
        storage
            .upsert_product(&record("Bolt", "brakes", "B1", "100"))
            .unwrap();
        storage
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_and_complete_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        assert!(run_id > 0);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        storage
            .complete_run(run_id, RunStatus::Completed, "finished", 42)
            .unwrap();

        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.close_reason.as_deref(), Some("finished"));
        assert_eq!(run.items_scraped, 42);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(7),
            Err(StorageError::RunNotFound(7))
        ));
        assert!(storage
            .complete_run(7, RunStatus::Failed, "error", 0)
            .is_err());
        assert!(storage.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_upsert_refreshes_existing_product() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage
            .upsert_product(&record("Acme", "brakes", "Model X", "100"))
            .unwrap();

        let mut again = record("Acme", "brakes", "Model X", "100");
        again.part_type = Some("oem".to_string());
        let second = storage.upsert_product(&again).unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.count_products().unwrap(), 1);
        assert_eq!(
            storage.get_product(first).unwrap().part_type.as_deref(),
            Some("oem")
        );
    }

    #[test]
    fn test_same_part_number_on_other_branch_is_separate() {
        let storage = seeded();
        assert_eq!(storage.count_products().unwrap(), 4);
    }

    #[test]
    fn test_query_with_filters() {
        let storage = seeded();
        let filter = ProductFilter {
            make: Some("Acme".to_string()),
            category: Some("brakes".to_string()),
            ..ProductFilter::default()
        };

        let page = storage
            .query_products(&filter, &Pagination::default())
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 1);
        let numbers: Vec<&str> = page.items.iter().map(|p| p.part_number.as_str()).collect();
        assert_eq!(numbers, vec!["100", "200"]);
    }

    #[test]
    fn test_query_pagination() {
        let storage = seeded();
        let pagination = Pagination::new(2, 3).unwrap();

        let page = storage
            .query_products(&ProductFilter::default(), &pagination)
            .unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].make, "Bolt");
    }

    #[test]
    fn test_query_empty_result() {
        let storage = seeded();
        let filter = ProductFilter {
            part_type: Some("oem".to_string()),
            ..ProductFilter::default()
        };

        let page = storage
            .query_products(&filter, &Pagination::default())
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_delete_product() {
        let mut storage = seeded();
        let id = storage
            .upsert_product(&record("Acme", "brakes", "Model Y", "200"))
            .unwrap();

        let response = storage.delete_product(id).unwrap();
        assert_eq!(response.deleted_count, 1);
        assert!(matches!(
            storage.get_product(id),
            Err(StorageError::ProductNotFound(_))
        ));

        let response = storage.delete_product(id).unwrap();
        assert_eq!(response.deleted_count, 0);
    }

    #[test]
    fn test_delete_by_part_number() {
        let mut storage = seeded();

        let response = storage.delete_products_by_part_number("100").unwrap();

        assert_eq!(response.deleted_count, 2);
        assert_eq!(storage.count_products().unwrap(), 2);
    }

    #[test]
    fn test_grouped_counts() {
        let storage = seeded();

        assert_eq!(
            storage.count_by_make().unwrap(),
            vec![("Acme".to_string(), 3), ("Bolt".to_string(), 1)]
        );
        assert_eq!(
            storage.count_by_category().unwrap(),
            vec![("brakes".to_string(), 3), ("engine".to_string(), 1)]
        );
    }
}
