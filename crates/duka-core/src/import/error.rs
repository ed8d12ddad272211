//! Whole-file import failures.
//!
//! Problems with individual rows are not errors; see
//! [`ImportRowError`](super::ImportRowError).

use thiserror::Error;

use super::session::ImportStage;

/// Errors that stop an import as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file has no data rows after blank lines are dropped.
    ///
    /// ## When This Occurs
    /// - Empty file
    /// - Header row only
    #[error("CSV file must have a header row and at least one data row (found {found} non-blank lines)")]
    TooFewLines { found: usize },

    /// One or more required header columns are absent.
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Every data row was malformed and skipped.
    #[error("No valid data rows found ({skipped} malformed rows skipped)")]
    NoRows { skipped: usize },

    /// The tokenizer rejected a line.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The session was asked to do something its current stage forbids.
    #[error("Cannot {action} while in {from:?} stage")]
    InvalidTransition {
        from: ImportStage,
        action: &'static str,
    },

    /// Row validation errors are still outstanding.
    #[error("{count} validation errors must be fixed before importing")]
    ValidationFailed { count: usize },
}

pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_each_column() {
        let err = ImportError::MissingColumns {
            missing: vec!["sellingprice".into(), "quantity".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns: sellingprice, quantity"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ImportError::InvalidTransition {
            from: ImportStage::Processing,
            action: "cancel",
        };
        assert_eq!(err.to_string(), "Cannot cancel while in Processing stage");
    }
}
