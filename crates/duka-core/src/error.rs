//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  duka-core import errors (import/error.rs)                             │
//! │  └── ImportError      - Whole-file parse failures, bad transitions     │
//! │                                                                         │
//! │  duka-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller notification     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row-level import problems are NOT errors: they are returned as data
//! (`ImportRowError`) so a UI can list them all at once.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sale cannot be found in the active set.
    ///
    /// ## When This Occurs
    /// - Id doesn't exist
    /// - Sale was deleted (deleted ids are never resurrected)
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A multi-item sale has more line items than allowed.
    #[error("Sale cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable date, unknown enum value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn must_not_be_negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }

    /// The offending field name.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
