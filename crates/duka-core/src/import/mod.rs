//! # Product Import
//!
//! Bulk product creation from an uploaded CSV file.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Product Import                                    │
//! │                                                                         │
//! │   file text                                                             │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   parser::parse ──────► ImportError (fatal, back to Upload)             │
//! │      │                                                                  │
//! │      ▼ ParsedImport { rows, skipped }                                   │
//! │   validator::validate ──► Vec<ImportRowError> (data, shown in preview)  │
//! │      │                                                                  │
//! │      ▼ zero errors + user confirms                                      │
//! │   commit::commit ──► ProductCatalog::create_product, one row at a time  │
//! │      │                 (failures counted, never abort the batch)        │
//! │      ▼                                                                  │
//! │   CommitOutcome { success_count, error_count, failures }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ImportSession`] wraps the steps in the `Upload → Preview → Processing →
//! Complete` state machine the upload screen drives.

pub mod commit;
pub mod error;
pub mod parser;
pub mod session;
pub mod validator;

pub use commit::{commit, generate_sku, CommitOutcome, CommitProgress, ProductCatalog, RowFailure};
pub use error::{ImportError, ImportResult};
pub use parser::{parse, ParsedImport, SkippedRow};
pub use session::{ImportSession, ImportStage};
pub use validator::{parse_date, validate, ImportRowError};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::NewProduct;

/// Header columns every import file must have (compared lower-case).
pub const REQUIRED_COLUMNS: &[&str] = &["name", "category", "costprice", "sellingprice", "quantity"];

/// Optional columns the parser understands.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "sku",
    "description",
    "minstocklevel",
    "unitofmeasure",
    "supplier",
    "location",
    "barcode",
    "batchnumber",
    "tags",
    "isperishable",
    "expirydate",
];

// =============================================================================
// Candidate Rows
// =============================================================================

/// A product parsed from an import file, not yet validated or saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    pub name: String,
    pub category: String,
    pub cost_price: Money,
    pub selling_price: Money,
    pub quantity: i64,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub min_stock_level: i64,
    pub unit_of_measure: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub tags: Option<String>,
    pub is_perishable: bool,
    /// As written in the file, checked by the validator.
    pub expiry_date: Option<String>,
}

impl ImportCandidate {
    /// Creation fields for the catalog. `sku` is the row's own or a generated
    /// one.
    pub fn to_new_product(&self, sku: String) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            sku: Some(sku),
            category: self.category.trim().to_string(),
            description: self.description.clone(),
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            quantity: self.quantity,
            min_stock_level: self.min_stock_level,
            unit_of_measure: self.unit_of_measure.clone(),
            supplier: self.supplier.clone(),
            location: self.location.clone(),
            barcode: self.barcode.clone(),
            batch_number: self.batch_number.clone(),
            tags: self.tags.clone(),
            is_perishable: self.is_perishable,
            expiry_date: self.expiry_date.as_deref().and_then(parse_date),
        }
    }
}

/// A candidate with its position in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    /// 1-based non-blank line number; the first data row is 2.
    pub row: usize,
    pub candidate: ImportCandidate,
}

// =============================================================================
// Template
// =============================================================================

/// A downloadable template: every recognised column plus one example row.
pub fn template_csv() -> String {
    let header: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .chain(OPTIONAL_COLUMNS.iter())
        .copied()
        .collect();

    let example = [
        "Sugar 1kg",
        "Groceries",
        "120",
        "150",
        "40",
        "SUG-1KG",
        "\"White sugar, 1kg packet\"",
        "10",
        "pcs",
        "Mumias Distributors",
        "Shelf A2",
        "6161101230012",
        "B-2026-03",
        "sugar;baking",
        "false",
        "",
    ];

    format!("{}\n{}\n", header.join(","), example.join(","))
}
