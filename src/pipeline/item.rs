//! Product records produced by the terminal stage

use crate::pipeline::{ContextKey, CrawlContext};
use serde::{Deserialize, Serialize};

/// A single part, with the ancestry of the branch it was found on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub make: String,
    pub category: String,
    pub model: String,
    pub part_type: Option<String>,
    pub part_number: String,
}

impl ProductRecord {
    /// Builds a record from a branch context and the fields parsed from a part entry
    ///
    /// Context fields that are not set become empty strings; the validator
    /// decides whether the record is acceptable.
    pub fn from_context(
        context: &CrawlContext,
        part_number: impl Into<String>,
        part_type: Option<String>,
    ) -> Self {
        let field = |key| context.get(key).unwrap_or_default().to_string();

        Self {
            make: field(ContextKey::Make),
            category: field(ContextKey::Category),
            model: field(ContextKey::Model),
            part_type,
            part_number: part_number.into(),
        }
    }
}

/// Extracts the part number from a `"<part_number> - <description>"` entry
///
/// The text is split on the first `-` and the left side is kept. Text
/// without a `-` is used whole.
///
/// # Examples
///
/// ```
/// use parts_crawler::pipeline::parse_part_number;
///
/// assert_eq!(parse_part_number("12345 - Brake Pad"), "12345");
/// assert_eq!(parse_part_number("AB-99"), "AB");
/// assert_eq!(parse_part_number(" XYZ999 "), "XYZ999");
/// ```
pub fn parse_part_number(text: &str) -> String {
    text.split_once('-')
        .map(|(left, _)| left)
        .unwrap_or(text)
        .trim()
        .to_string()
}

/// Trims and lowercases a part type label; blank labels count as absent
pub fn normalize_part_type(label: Option<&str>) -> Option<String> {
    label
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_number_with_description() {
        assert_eq!(parse_part_number("12345 - Brake Pad"), "12345");
    }

    #[test]
    fn test_part_number_splits_on_first_dash() {
        assert_eq!(parse_part_number("AB-99"), "AB");
        assert_eq!(parse_part_number("AB-99 - Filter"), "AB");
    }

    #[test]
    fn test_part_number_without_dash() {
        assert_eq!(parse_part_number("XYZ999"), "XYZ999");
        assert_eq!(parse_part_number("  XYZ999\n"), "XYZ999");
    }

    #[test]
    fn test_part_number_leading_dash_is_empty() {
        assert_eq!(parse_part_number(" - Gasket"), "");
    }

    #[test]
    fn test_normalize_part_type() {
        assert_eq!(normalize_part_type(Some(" OEM ")), Some("oem".to_string()));
        assert_eq!(normalize_part_type(Some("   ")), None);
        assert_eq!(normalize_part_type(None), None);
    }

    #[test]
    fn test_from_context() {
        let context = CrawlContext::new()
            .extend(ContextKey::Make, "Acme")
            .and_then(|c| c.extend(ContextKey::Category, "brakes"))
            .and_then(|c| c.extend(ContextKey::Model, "Model X"))
            .unwrap();

        let record = ProductRecord::from_context(&context, "100", None);
        assert_eq!(
            record,
            ProductRecord {
                make: "Acme".to_string(),
                category: "brakes".to_string(),
                model: "Model X".to_string(),
                part_type: None,
                part_number: "100".to_string(),
            }
        );
    }

    #[test]
    fn test_from_context_missing_fields_are_empty() {
        let record = ProductRecord::from_context(&CrawlContext::new(), "100", None);
        assert_eq!(record.make, "");
        assert_eq!(record.model, "");
    }
}
