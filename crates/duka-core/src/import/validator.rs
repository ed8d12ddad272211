//! Row-level checks for parsed import candidates.
//!
//! Every row is checked, every problem is reported, nothing short-circuits.
//! The result is data for a preview table, not an error.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ImportCandidate, ImportRow};
use crate::error::ValidationError;

/// One problem with one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// Same numbering as [`ImportRow::row`].
    pub row: usize,
    /// camelCase field name, e.g. `sellingPrice`.
    pub field: String,
    pub message: String,
}

impl ImportRowError {
    pub fn new(row: usize, error: ValidationError) -> Self {
        ImportRowError {
            row,
            field: error.field().to_string(),
            message: error.to_string(),
        }
    }
}

/// Checks every row and returns all problems in row order.
///
/// ## Rules
/// - `name`, `category` non-empty after trimming
/// - `costPrice ≥ 0`, `sellingPrice > 0`, `quantity ≥ 0`, `minStockLevel ≥ 0`
/// - `expiryDate`, when present, is a calendar date (see [`parse_date`])
pub fn validate(rows: &[ImportRow]) -> Vec<ImportRowError> {
    rows.iter()
        .flat_map(|row| {
            check_candidate(&row.candidate)
                .into_iter()
                .map(move |error| ImportRowError::new(row.row, error))
        })
        .collect()
}

fn check_candidate(candidate: &ImportCandidate) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if candidate.name.trim().is_empty() {
        errors.push(ValidationError::required("name"));
    }
    if candidate.category.trim().is_empty() {
        errors.push(ValidationError::required("category"));
    }
    if candidate.cost_price.is_negative() {
        errors.push(ValidationError::must_not_be_negative("costPrice"));
    }
    if !candidate.selling_price.is_positive() {
        errors.push(ValidationError::must_be_positive("sellingPrice"));
    }
    if candidate.quantity < 0 {
        errors.push(ValidationError::must_not_be_negative("quantity"));
    }
    if candidate.min_stock_level < 0 {
        errors.push(ValidationError::must_not_be_negative("minStockLevel"));
    }
    if let Some(raw) = candidate.expiry_date.as_deref() {
        if parse_date(raw).is_none() {
            errors.push(ValidationError::InvalidFormat {
                field: "expiryDate".to_string(),
                reason: format!("'{}' is not a valid date", raw),
            });
        }
    }

    errors
}

/// Parses the date spellings shop owners actually type.
///
/// Tried in order: `YYYY-MM-DD`, `DD/MM/YYYY`, `MM/DD/YYYY`, RFC 3339.
/// Ambiguous slashed dates read day-first.
///
/// ## Example
/// ```rust
/// use duka_core::import::parse_date;
///
/// assert!(parse_date("2026-02-28").is_some());
/// assert!(parse_date("31/12/2026").is_some());
/// assert!(parse_date("12/31/2026").is_some());
/// assert!(parse_date("2026-02-30").is_none());
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
