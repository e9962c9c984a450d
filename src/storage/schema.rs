//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Parts-Crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    close_reason TEXT,
    items_scraped INTEGER NOT NULL DEFAULT 0
);

-- One row per distinct part in the catalog tree
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    make TEXT NOT NULL,
    category TEXT NOT NULL,
    model TEXT NOT NULL,
    part_type TEXT,
    part_number TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    UNIQUE(make, category, model, part_number)
);

CREATE INDEX IF NOT EXISTS idx_products_make ON products(make);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
CREATE INDEX IF NOT EXISTS idx_products_part_number ON products(part_number);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
