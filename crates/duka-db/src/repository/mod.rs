//! # Repository Module
//!
//! Database repository implementations for Duka.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  duka-cli                                                              │
//! │       │  db.sales().get_sales("owner-1", 100)                          │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(owner_id, draft)                                      │
//! │  ├── update_sale(id, patch)                                            │
//! │  ├── delete_sale(id)                                                   │
//! │  └── get_sales(owner_id, limit)                                        │
//! │       │  SQL → row struct (FromRow) → TryFrom → domain type            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog products
//! - [`SaleRepository`](sale::SaleRepository) - Single-item sales
//! - [`MultiItemSaleRepository`](multi_item_sale::MultiItemSaleRepository) -
//!   Multi-item sales and their line items

pub mod multi_item_sale;
pub mod product;
pub mod sale;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use duka_core::{Money, Percent, Quantity};

use crate::error::{DbError, DbResult};

// =============================================================================
// Column Codecs
// =============================================================================
//
// Decimals are TEXT, instants are epoch-millisecond INTEGERs. Reading a value
// that doesn't decode is reported as `DbError::Corrupt` naming the column.

pub(crate) fn decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| DbError::corrupt(column, raw))
}

pub(crate) fn money(column: &str, raw: &str) -> DbResult<Money> {
    decimal(column, raw).map(Money::new)
}

pub(crate) fn opt_money(column: &str, raw: Option<&str>) -> DbResult<Option<Money>> {
    raw.map(|raw| money(column, raw)).transpose()
}

pub(crate) fn quantity(column: &str, raw: &str) -> DbResult<Quantity> {
    Quantity::new(decimal(column, raw)?).ok_or_else(|| DbError::corrupt(column, raw))
}

pub(crate) fn opt_percent(column: &str, raw: Option<&str>) -> DbResult<Option<Percent>> {
    raw.map(|raw| Percent::new(decimal(column, raw)?).ok_or_else(|| DbError::corrupt(column, raw)))
        .transpose()
}

/// Parses an enum column through its `FromStr`.
pub(crate) fn parse_enum<T: FromStr>(column: &str, raw: &str) -> DbResult<T> {
    raw.parse().map_err(|_| DbError::corrupt(column, raw))
}

pub(crate) fn instant(column: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DbError::corrupt(column, millis.to_string()))
}

pub(crate) fn opt_instant(column: &str, millis: Option<i64>) -> DbResult<Option<DateTime<Utc>>> {
    millis.map(|ms| instant(column, ms)).transpose()
}

/// Current time truncated to what the database stores.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_codecs() {
        assert_eq!(money("t.c", "12.50").unwrap(), Money::new(dec!(12.50)));
        assert!(matches!(money("t.c", "abc"), Err(DbError::Corrupt { .. })));
        assert!(quantity("t.q", "-1").is_err());
        assert_eq!(opt_money("t.c", None).unwrap(), None);
        assert_eq!(opt_percent("t.p", Some("16")).unwrap(), Some(Percent::from(16)));
    }

    #[test]
    fn test_instant_round_trip() {
        let now = now_millis();
        assert_eq!(instant("t.ts", now.timestamp_millis()).unwrap(), now);
    }

    #[test]
    fn test_parse_enum() {
        let method: duka_core::PaymentMethod = parse_enum("sales.payment_method", "MPESA").unwrap();
        assert_eq!(method, duka_core::PaymentMethod::Mpesa);
        assert!(parse_enum::<duka_core::PaymentMethod>("sales.payment_method", "GOLD").is_err());
    }
}
