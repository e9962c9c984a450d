//! Hierarchical crawl pipeline
//!
//! The catalog is a four level tree: make → category → model → part. Every
//! fetched page is handed to the handler of the stage its request was issued
//! for, together with the context accumulated along its branch. Intermediate
//! stages emit follow-up requests carrying an extended copy of that context;
//! the terminal stage emits validated product records.
//!
//! Everything in here is synchronous and free of shared mutable state, so
//! handlers for unrelated branches can run concurrently.

mod context;
mod extract;
mod failure;
mod item;
mod request;
mod stages;
mod validator;

pub use context::{ContextKey, CrawlContext};
pub use extract::{Element, Page};
pub use failure::{on_failure, FailureRecord};
pub use item::{normalize_part_type, parse_part_number, ProductRecord};
pub use request::{FetchRequest, Stage};
pub use stages::{dispatch, StageHandler, StageOutput, StageSelectors};
pub use validator::{missing_field, validate, REQUIRED_FIELDS};
