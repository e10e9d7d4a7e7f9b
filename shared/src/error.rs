//! Error types for input validation

use thiserror::Error;

/// Errors raised while validating user-supplied input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Search query was empty after trimming
    #[error("Missing query")]
    EmptyQuery,

    /// Search query exceeded the accepted length
    #[error("Query too long (max {0} characters)")]
    QueryTooLong(usize),

    /// Country filter was not an ISO-3166 alpha-2 code
    #[error("Invalid country code: {0}")]
    InvalidCountry(String),

    /// Profile slug was numeric but not a well-formed public id
    #[error("Invalid profile id: {0}")]
    InvalidSlug(String),

    /// Unknown invite status or direction
    #[error("Invalid {field}: {value}")]
    InvalidEnum {
        /// Name of the rejected field
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// A field failed its format rules
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Name of the rejected field
        field: &'static str,
        /// Human-readable rule that was broken
        reason: &'static str,
    },

    /// A required field was missing or blank
    #[error("Missing {0}")]
    Missing(&'static str),
}

/// Result type alias for validation
pub type Result<T> = std::result::Result<T, ValidationError>;
