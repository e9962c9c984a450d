//! Failed fetch handling

use std::fmt;
use url::Url;

/// A request that could not be turned into a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub url: Url,
    pub detail: String,
}

impl FailureRecord {
    pub fn new(url: Url, detail: impl Into<String>) -> Self {
        Self {
            url,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.detail)
    }
}

/// Logs a failed request
///
/// The branch behind the request is abandoned. Nothing is retried and the
/// rest of the crawl carries on.
pub fn on_failure(failure: &FailureRecord) {
    tracing::error!("Request failed: {}, error: {}", failure.url, failure.detail);
}
