pub mod document;
pub mod portfolio;
pub mod proposal;
pub mod tracking;

use mongodb::bson::oid::ObjectId;

use crate::errors::AppError;

/// Parses a path id. A malformed id cannot name an existing record, so it
/// maps to 404 rather than 400.
pub fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

/// Keeps the first `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
