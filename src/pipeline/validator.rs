//! Acceptance check for terminal records

use crate::pipeline::ProductRecord;

/// Fields that must be non-blank for a record to be stored
pub const REQUIRED_FIELDS: [&str; 3] = ["make", "model", "part_number"];

/// Name of the first required field that is blank, if any
pub fn missing_field(record: &ProductRecord) -> Option<&'static str> {
    let values = [
        record.make.as_str(),
        record.model.as_str(),
        record.part_number.as_str(),
    ];

    REQUIRED_FIELDS
        .iter()
        .zip(values)
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

/// Returns true if `record` has every required field
///
/// A rejected record is logged with the first missing field name.
pub fn validate(record: &ProductRecord) -> bool {
    match missing_field(record) {
        Some(field) => {
            tracing::warn!(
                "Missing required field {} in item (make: '{}', model: '{}', part_number: '{}')",
                field,
                record.make,
                record.model,
                record.part_number
            );
            false
        }
        None => true,
    }
}
