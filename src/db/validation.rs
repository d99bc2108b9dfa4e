//! In-memory field validation for catalog records
//!
//! Records are validated before they are written, so a rejected mutation
//! never reaches the store. Uniqueness is the one rule left to the database
//! (see [DbError::Conflict](super::DbError::Conflict)).

use thiserror::Error;

/// Minimum length of an author's name
pub const AUTHOR_NAME_MIN_LEN: usize = 4;
/// Minimum length of a book title
pub const BOOK_TITLE_MIN_LEN: usize = 5;
/// Minimum length of a username
pub const USERNAME_MIN_LEN: usize = 3;

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Implemented by every persisted record type
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Require a trimmed string of at least `min` characters
pub(crate) fn min_length(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, "is required"));
    }
    if len < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {} characters long", min),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_required() {
        let err = min_length("name", "   ", 4).unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "is required");
    }

    #[test]
    fn short_values_report_the_minimum() {
        let err = min_length("title", "Dune", 5).unwrap_err();
        assert_eq!(err.to_string(), "title: must be at least 5 characters long");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(min_length("name", "Åsa ", 3).is_ok());
        assert!(min_length("name", "Åsa", 4).is_err());
    }
}
