//! # Validation Module
//!
//! Business rule validation for sale drafts and edits.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form boundary (form.rs)                                      │
//! │  ├── Raw text coerced to numbers                                       │
//! │  └── Live totals, never fails                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Draft submission                                             │
//! │  └── THIS MODULE: names present, quantities positive, prices ≥ 0       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Import rows are checked separately (`import::validator`) because their
//! problems are reported as data, all at once, instead of failing fast.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::types::{CustomerInfo, MultiItemSaleDraft, SaleItem, SingleSaleDraft};
use crate::MAX_SALE_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 1000;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use duka_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Sugar 1kg").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("productName"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "productName".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// A sold quantity must be strictly positive.
pub fn validate_quantity(quantity: Quantity) -> ValidationResult<()> {
    if quantity.value() <= Decimal::ZERO {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    Ok(())
}

/// Prices may be zero but never negative.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::must_not_be_negative(field));
    }
    Ok(())
}

/// Optional customer details: email must at least look like one.
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult<()> {
    if let Some(email) = customer.email.as_deref().map(str::trim) {
        if !email.is_empty() && !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "customerEmail".to_string(),
                reason: "must contain @".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(notes) if notes.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Line fields shared by single sales and multi-sale items.
pub fn validate_single_sale_fields(
    product_name: &str,
    quantity: Quantity,
    unit_price: Money,
    cost_price: Money,
) -> ValidationResult<()> {
    validate_product_name(product_name)?;
    validate_quantity(quantity)?;
    validate_price("unitPrice", unit_price)?;
    validate_price("costPrice", cost_price)?;
    Ok(())
}

/// Validates the item list of a multi-item sale.
///
/// ## Rules
/// - At least one item
/// - At most [`MAX_SALE_ITEMS`] items
/// - Every item passes [`validate_single_sale_fields`]
pub fn validate_sale_items(items: &[SaleItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(ValidationError::required("items").into());
    }

    if items.len() > MAX_SALE_ITEMS {
        return Err(CoreError::TooManyItems {
            max: MAX_SALE_ITEMS,
        });
    }

    for item in items {
        validate_single_sale_fields(
            &item.product_name,
            item.quantity,
            item.unit_price,
            item.cost_price,
        )?;
    }

    Ok(())
}

pub fn validate_single_sale_draft(draft: &SingleSaleDraft) -> CoreResult<()> {
    validate_single_sale_fields(
        &draft.product_name,
        draft.quantity,
        draft.unit_price,
        draft.cost_price,
    )?;
    validate_customer(&draft.customer)?;
    validate_notes(draft.notes.as_deref())?;
    Ok(())
}

pub fn validate_multi_item_sale_draft(draft: &MultiItemSaleDraft) -> CoreResult<()> {
    validate_sale_items(&draft.items)?;
    validate_customer(&draft.customer)?;
    validate_notes(draft.notes.as_deref())?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleType;

    fn item(name: &str, qty: i32) -> SaleItem {
        SaleItem::new(
            None,
            name,
            SaleType::Service,
            Quantity::from(qty),
            Money::from(10),
            Money::zero(),
        )
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Bread").is_ok());
        assert_eq!(
            validate_product_name(""),
            Err(ValidationError::required("productName"))
        );
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity_rejects_zero() {
        assert!(validate_quantity(Quantity::from(1)).is_ok());
        assert!(validate_quantity(Quantity::zero()).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("unitPrice", Money::zero()).is_ok());
        assert_eq!(
            validate_price("costPrice", Money::from(-1)),
            Err(ValidationError::must_not_be_negative("costPrice"))
        );
    }

    #[test]
    fn test_validate_sale_items() {
        assert!(validate_sale_items(&[item("Haircut", 1)]).is_ok());
        assert!(matches!(
            validate_sale_items(&[]),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(validate_sale_items(&[item("Haircut", 1), item("", 1)]).is_err());

        let too_many: Vec<_> = (0..=MAX_SALE_ITEMS).map(|_| item("Pen", 1)).collect();
        assert!(matches!(
            validate_sale_items(&too_many),
            Err(CoreError::TooManyItems { .. })
        ));
    }

    #[test]
    fn test_validate_customer_email() {
        let mut customer = CustomerInfo::default();
        assert!(validate_customer(&customer).is_ok());

        customer.email = Some("jane.example.com".into());
        assert!(validate_customer(&customer).is_err());

        customer.email = Some("jane@example.com".into());
        assert!(validate_customer(&customer).is_ok());
    }
}
