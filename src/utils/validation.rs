//! Settings validation helpers.
//!
//! Failures are `validation.invalid_argument` errors naming the offending field.

use crate::error::{Error, Result};

/// Require a string to be non-empty after trimming.
///
/// Returns the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

/// Require a list setting to have at least one entry.
pub fn require_non_empty_vec<'a, T>(vec: &'a [T], field: &str, message: &str) -> Result<&'a [T]> {
    if vec.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(vec)
    }
}
