//! Context accumulated along a branch of the catalog tree

use crate::{PipelineError, PipelineResult};
use std::fmt;

/// Fields a branch picks up on its way down the tree, in stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    Make,
    Category,
    Model,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Category => "category",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping of the values collected so far on one branch
///
/// A context is never changed in place. [`CrawlContext::extend`] returns a new
/// value, so sibling branches that still hold the parent context never observe
/// a child's additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlContext {
    fields: Vec<(ContextKey, String)>,
}

impl CrawlContext {
    /// Creates the empty context carried by root requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `key → value` appended
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateKey`] if `key` is already set. Stage
    /// ordering makes that impossible for correctly wired handlers.
    pub fn extend(&self, key: ContextKey, value: impl Into<String>) -> PipelineResult<CrawlContext> {
        if self.contains(key) {
            return Err(PipelineError::DuplicateKey { key });
        }

        let mut fields = self.fields.clone();
        fields.push((key, value.into()));
        Ok(Self { fields })
    }

    /// Gets the value stored for `key`
    pub fn get(&self, key: ContextKey) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.fields.iter().any(|(k, _)| *k == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = (ContextKey, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for CrawlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("<root>");
        }

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}
