//! # duka-core: Pure Business Logic for Duka
//!
//! This crate is the **heart** of Duka. It contains the sale arithmetic,
//! the dashboard rollups and the product import pipeline as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Duka Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI (sale forms, dashboard, import)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │calculator │  │  reports  │  │  import   │  │   │
//! │  │   │  Money    │  │ line/tax  │  │ windows   │  │ parse     │  │   │
//! │  │   │  Percent  │  │ discount  │  │ top prods │  │ validate  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • NO FILE SYSTEM                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    duka-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money`, `Quantity` and `Percent` over exact decimals
//! - [`types`] - Domain types (sales, items, products, drafts, patches)
//! - [`calculator`] - Line, tax, discount, total, profit and display names
//! - [`form`] - Raw form input converted into calculator inputs
//! - [`reports`] - Date windows, rollups and top-product ranking
//! - [`import`] - CSV product import: parse, validate, commit
//! - [`locale`] - Currency symbols and display formatting
//! - [`validation`] - Business rule validation for sale drafts
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::calculator::compute_totals;
//! use duka_core::money::{Money, Percent, Quantity};
//! use duka_core::types::{SaleItem, SaleType};
//!
//! let items = vec![SaleItem::new(
//!     None,
//!     "Sugar 1kg",
//!     SaleType::Product,
//!     Quantity::from(2),
//!     Money::from(100),
//!     Money::from(60),
//! )];
//!
//! let totals = compute_totals(&items, Some(Percent::from(16)), None);
//! assert_eq!(totals.total, Money::from(232));
//! ```

pub mod calculator;
pub mod error;
pub mod form;
pub mod import;
pub mod locale;
pub mod money;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::{Money, Percent, Quantity};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of trailing id characters shown in sale display names.
pub const SHORT_ID_LEN: usize = 4;

/// Minimum stock level given to imported products that don't specify one.
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 5;

/// Unit of measure given to imported products that don't specify one.
pub const DEFAULT_UNIT_OF_MEASURE: &str = "pcs";

/// Maximum number of items allowed in a single multi-item sale.
pub const MAX_SALE_ITEMS: usize = 100;
