pub mod member;
pub mod project;
pub mod skill;
pub mod task;

use uuid::Uuid;

use crate::error::AppError;

/// Generates a fresh document ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Checks that a path or payload ID is a well-formed UUID and returns it in
/// canonical hyphenated form.
pub fn parse_id(raw: &str, what: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::Validation(format!("Malformed {} id: {:?}", what, raw)))
}
