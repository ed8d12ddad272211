//! # Import Parser
//!
//! Turns uploaded file text into candidate products.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  text                                                                   │
//! │   │  \r\n, \r → \n ; drop blank lines                                   │
//! │   ▼                                                                     │
//! │  lines[0]  ──► tokenize ──► lower-case ──► required columns present?   │
//! │   │                                          │ no → MissingColumns      │
//! │   ▼                                          ▼ yes                      │
//! │  lines[1..] ──► tokenize ──► fewer tokens than headers? ──► skipped     │
//! │                                │ no                                     │
//! │                                ▼                                        │
//! │                   map columns, lenient numbers ──► ImportRow            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing never judges values. A price of `abc` becomes zero here and is
//! reported by the validator.

use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};
use ts_rs::TS;

use super::error::{ImportError, ImportResult};
use super::{ImportCandidate, ImportRow, REQUIRED_COLUMNS};
use crate::money::Money;
use crate::{DEFAULT_MIN_STOCK_LEVEL, DEFAULT_UNIT_OF_MEASURE};

/// A data row dropped for having fewer fields than the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based non-blank line number.
    pub row: usize,
    pub found: usize,
    pub expected: usize,
}

/// The result of a successful parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ParsedImport {
    /// Lower-cased header tokens in file order.
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedImport {
    pub fn candidates(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.rows.iter().map(|row| &row.candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses import file text into candidate rows.
///
/// ## Errors
/// - [`ImportError::TooFewLines`] with fewer than two non-blank lines
/// - [`ImportError::MissingColumns`] naming every required column absent
///   from the header
pub fn parse(text: &str) -> ImportResult<ParsedImport> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(ImportError::TooFewLines { found: lines.len() });
    }

    let headers: Vec<String> = tokenize(lines[0])?
        .iter()
        .map(str::to_lowercase)
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns { missing });
    }

    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut parsed = ParsedImport {
        headers: headers.clone(),
        ..Default::default()
    };

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let row = idx + 1;
        let record = tokenize(line)?;

        if record.len() < headers.len() {
            warn!(
                row,
                found = record.len(),
                expected = headers.len(),
                "Skipping malformed import row"
            );
            parsed.skipped.push(SkippedRow {
                row,
                found: record.len(),
                expected: headers.len(),
            });
            continue;
        }

        let fields = Fields {
            columns: &columns,
            record: &record,
        };
        parsed.rows.push(ImportRow {
            row,
            candidate: fields.candidate(),
        });
    }

    debug!(
        rows = parsed.rows.len(),
        skipped = parsed.skipped.len(),
        "Parsed import file"
    );

    Ok(parsed)
}

/// Splits one line on commas, honouring double quotes.
fn tokenize(line: &str) -> ImportResult<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(record) => Ok(record?),
        None => Ok(StringRecord::new()),
    }
}

// =============================================================================
// Field Mapping
// =============================================================================

struct Fields<'a> {
    columns: &'a HashMap<&'a str, usize>,
    record: &'a StringRecord,
}

impl Fields<'_> {
    /// Raw trimmed value, empty when the column is absent.
    fn raw(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|idx| self.record.get(*idx))
            .unwrap_or("")
    }

    fn text(&self, column: &str) -> Option<String> {
        let value = self.raw(column);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn money(&self, column: &str) -> Money {
        Money::new(lenient_decimal(self.raw(column)).unwrap_or_default())
    }

    fn integer(&self, column: &str) -> Option<i64> {
        lenient_decimal(self.raw(column)).and_then(|d| i64::try_from(d.trunc()).ok())
    }

    fn candidate(&self) -> ImportCandidate {
        ImportCandidate {
            name: self.raw("name").to_string(),
            category: self.raw("category").to_string(),
            cost_price: self.money("costprice"),
            selling_price: self.money("sellingprice"),
            quantity: self.integer("quantity").unwrap_or(0),
            sku: self.text("sku"),
            description: self.text("description"),
            min_stock_level: self
                .integer("minstocklevel")
                .unwrap_or(DEFAULT_MIN_STOCK_LEVEL),
            unit_of_measure: self
                .text("unitofmeasure")
                .unwrap_or_else(|| DEFAULT_UNIT_OF_MEASURE.to_string()),
            supplier: self.text("supplier"),
            location: self.text("location"),
            barcode: self.text("barcode"),
            batch_number: self.text("batchnumber"),
            tags: self.text("tags"),
            is_perishable: self.raw("isperishable").eq_ignore_ascii_case("true"),
            expiry_date: self.text("expirydate"),
        }
    }
}

/// Leading number of a field, ignoring a currency prefix and thousands
/// separators. `None` when there is no number at all.
fn lenient_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|c: char| c.is_alphabetic() || c.is_whitespace() || c == '$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let end = cleaned
        .char_indices()
        .find(|(idx, c)| !(c.is_ascii_digit() || *c == '.' || (*idx == 0 && (*c == '-' || *c == '+'))))
        .map(|(idx, _)| idx)
        .unwrap_or(cleaned.len());

    Decimal::from_str(&cleaned[..end]).ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "name,category,costprice,sellingprice,quantity";

    #[test]
    fn test_parse_single_widget_row() {
        let parsed = parse(&format!("{}\nWidget,Hardware,10,20,5", HEADER)).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.row, 2);
        assert_eq!(row.candidate.name, "Widget");
        assert_eq!(row.candidate.category, "Hardware");
        assert_eq!(row.candidate.cost_price, Money::from(10));
        assert_eq!(row.candidate.selling_price, Money::from(20));
        assert_eq!(row.candidate.quantity, 5);
        assert_eq!(row.candidate.min_stock_level, 5);
        assert_eq!(row.candidate.unit_of_measure, "pcs");
        assert!(!row.candidate.is_perishable);
        assert_eq!(row.candidate.sku, None);
    }

    #[test]
    fn test_missing_selling_price_column() {
        let err = parse("name,category,costprice,quantity\nWidget,Hardware,10,5").unwrap_err();

        match &err {
            ImportError::MissingColumns { missing } => assert_eq!(missing, &vec!["sellingprice"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("sellingprice"));
    }

    #[test]
    fn test_header_matching_is_case_insensitive() {
        let parsed = parse("Name,Category,CostPrice,SellingPrice,Quantity\nA,B,1,2,3").unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.headers[2], "costprice");
    }

    #[test]
    fn test_too_few_lines() {
        assert!(matches!(parse(""), Err(ImportError::TooFewLines { found: 0 })));
        assert!(matches!(
            parse(&format!("{}\n\n   \n", HEADER)),
            Err(ImportError::TooFewLines { found: 1 })
        ));
    }

    #[test]
    fn test_line_endings_and_blank_lines() {
        let text = format!("{}\r\nA,Cat,1,2,3\r\rB,Cat,1,2,3\r\n", HEADER);
        let parsed = parse(&text).unwrap();
        let rows: Vec<usize> = parsed.rows.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn test_quoted_commas_are_not_split() {
        let text = format!(
            "{},description\n\"Nails, 2\"\"\",Hardware,1,2,3,\"Box of 100, galvanised\"",
            HEADER
        );
        let parsed = parse(&text).unwrap();
        let candidate = &parsed.rows[0].candidate;
        assert_eq!(candidate.name, "Nails, 2\"");
        assert_eq!(candidate.description.as_deref(), Some("Box of 100, galvanised"));
    }

    #[test]
    fn test_short_rows_are_skipped_and_reported() {
        let text = format!("{}\nA,Cat,1,2\nB,Cat,1,2,3", HEADER);
        let parsed = parse(&text).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].row, 3);
        assert_eq!(
            parsed.skipped,
            vec![SkippedRow {
                row: 2,
                found: 4,
                expected: 5
            }]
        );
    }

    #[test]
    fn test_lenient_numbers() {
        let text = format!(
            "{},minstocklevel,isperishable\nA,Cat,abc,KSh 1,200.50,7.9,,TRUE",
            HEADER
        );
        // The unquoted thousands separator splits the price in two.
        let parsed = parse(&text).unwrap();
        let candidate = &parsed.rows[0].candidate;
        assert_eq!(candidate.cost_price, Money::zero());
        assert_eq!(candidate.selling_price, Money::from(1));
        assert_eq!(candidate.quantity, 200);

        let text = format!(
            "{},minstocklevel,isperishable\nA,Cat,abc,\"KSh 1,200.50\",7.9,,TRUE",
            HEADER
        );
        let candidate = parse(&text).unwrap().rows.remove(0).candidate;
        assert_eq!(candidate.selling_price, Money::new(dec!(1200.50)));
        assert_eq!(candidate.quantity, 7);
        assert_eq!(candidate.min_stock_level, 5);
        assert!(candidate.is_perishable);
    }

    #[test]
    fn test_negative_values_survive_parsing() {
        let parsed = parse(&format!("{}\nA,Cat,-1,2,-3", HEADER)).unwrap();
        let candidate = &parsed.rows[0].candidate;
        assert_eq!(candidate.cost_price, Money::from(-1));
        assert_eq!(candidate.quantity, -3);
    }

    #[test]
    fn test_lenient_decimal() {
        assert_eq!(lenient_decimal("12.5kg"), Some(dec!(12.5)));
        assert_eq!(lenient_decimal("$1,000"), Some(dec!(1000)));
        assert_eq!(lenient_decimal("-4"), Some(dec!(-4)));
        assert_eq!(lenient_decimal(""), None);
        assert_eq!(lenient_decimal("n/a"), None);
    }
}
