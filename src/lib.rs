//! Parts-Crawler: a vendor parts catalog harvester
//!
//! This crate walks a parts catalog organised as a make → category → model → part
//! tree, carries the accumulated ancestry of each branch from stage to stage, and
//! stores every validated part as a product record in SQLite.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Parts-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Crawl pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid crawler state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlerState,
        to: state::CrawlerState,
    },

    #[error("Crawl task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector for {name}: '{selector}'")]
    InvalidSelector { name: String, selector: String },
}

/// Wiring bugs inside the stage pipeline
///
/// These never come from page content. Hitting one means a stage handler
/// was connected to the wrong stage, so the crawl is aborted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Context key '{key}' is already set")]
    DuplicateKey { key: pipeline::ContextKey },

    #[error("Stage {stage:?} has no follow-up stage")]
    NoFollowUpStage { stage: pipeline::Stage },
}

/// Result type alias for Parts-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for stage pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{CrawlContext, FetchRequest, ProductRecord, Stage};
pub use state::CrawlerState;
