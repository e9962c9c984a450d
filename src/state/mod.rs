//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlerState`: lifecycle of the crawl controller (idle, running, closed)

mod crawler_state;

pub use crawler_state::CrawlerState;
