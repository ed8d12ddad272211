//! # Sale Form State
//!
//! Raw, possibly half-typed form values and their conversion into calculator
//! inputs.
//!
//! ## Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   keystrokes ──► RawAmount ("12.", "", "abc", NaN, -3)                  │
//! │                      │                                                  │
//! │                      ▼  to_money / to_quantity / to_percent             │
//! │                 Money / Quantity / Percent  (never negative, never NaN) │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │              calculator::compute_totals  ──► live preview               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coercion happens here and only here. The calculator receives valid
//! values, and the preview never fails while the user is mid-edit.
//!
//! Items are addressed by their position in the form, so removing a row
//! shifts later rows down by one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::calculator::{self, SaleTotals};
use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, Percent, Quantity};
use crate::types::{
    CustomerInfo, Discount, DiscountType, MultiItemSaleDraft, PaymentMethod, Product, SaleItem,
    SaleType,
};

// =============================================================================
// Raw Amount
// =============================================================================

/// A numeric form field as the user left it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum RawAmount {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// The value as a decimal. Empty, unparseable, non-finite and negative
    /// input all become zero.
    pub fn to_decimal(&self) -> Decimal {
        let value = match self {
            RawAmount::Empty => None,
            RawAmount::Number(n) if n.is_finite() => Decimal::try_from(*n).ok(),
            RawAmount::Number(_) => None,
            RawAmount::Text(text) => {
                let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
                Decimal::from_str(&cleaned).ok()
            }
        };

        value
            .filter(|v| !v.is_sign_negative())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn to_money(&self) -> Money {
        Money::new(self.to_decimal())
    }

    pub fn to_quantity(&self) -> Quantity {
        Quantity::coerce(self.to_decimal())
    }

    pub fn to_percent(&self) -> Percent {
        Percent::coerce(self.to_decimal())
    }

    /// Blank input (as opposed to an explicit zero).
    pub fn is_blank(&self) -> bool {
        match self {
            RawAmount::Empty => true,
            RawAmount::Text(text) => text.trim().is_empty(),
            RawAmount::Number(_) => false,
        }
    }
}

impl From<&str> for RawAmount {
    fn from(text: &str) -> Self {
        RawAmount::Text(text.to_string())
    }
}

impl From<f64> for RawAmount {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

// =============================================================================
// Item Row
// =============================================================================

/// One line of the multi-item sale form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemForm {
    pub product_id: Option<String>,
    pub product_name: String,
    pub sale_type: SaleType,
    pub quantity: RawAmount,
    pub unit_price: RawAmount,
    pub cost_price: RawAmount,
}

impl SaleItemForm {
    /// Fills the row from a catalog product, keeping the typed quantity.
    pub fn select_product(&mut self, product: &Product) {
        self.product_id = Some(product.id.clone());
        self.product_name = product.name.clone();
        self.sale_type = SaleType::Product;
        self.unit_price = RawAmount::Text(product.selling_price.amount().to_string());
        self.cost_price = RawAmount::Text(product.cost_price.amount().to_string());
    }

    pub fn to_item(&self) -> SaleItem {
        SaleItem::new(
            self.product_id.clone(),
            self.product_name.trim(),
            self.sale_type,
            self.quantity.to_quantity(),
            self.unit_price.to_money(),
            self.cost_price.to_money(),
        )
    }

    pub fn line_total(&self) -> Money {
        calculator::line_total(self.quantity.to_quantity(), self.unit_price.to_money())
    }
}

// =============================================================================
// Multi-Item Form
// =============================================================================

/// The whole multi-item sale form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MultiItemSaleForm {
    pub items: Vec<SaleItemForm>,
    pub tax_rate: RawAmount,
    pub discount_type: DiscountType,
    pub discount_value: RawAmount,
    pub payment_method: Option<PaymentMethod>,
    pub customer: CustomerInfo,
    pub notes: String,
}

impl Default for MultiItemSaleForm {
    fn default() -> Self {
        MultiItemSaleForm {
            items: vec![SaleItemForm::default()],
            tax_rate: RawAmount::Empty,
            discount_type: DiscountType::Fixed,
            discount_value: RawAmount::Empty,
            payment_method: None,
            customer: CustomerInfo::default(),
            notes: String::new(),
        }
    }
}

impl MultiItemSaleForm {
    /// A form with one empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty row and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.items.push(SaleItemForm::default());
        self.items.len() - 1
    }

    /// Removes a row. The last remaining row is cleared instead of removed.
    pub fn remove_item(&mut self, index: usize) -> Option<SaleItemForm> {
        if index >= self.items.len() {
            return None;
        }
        if self.items.len() == 1 {
            return Some(std::mem::take(&mut self.items[0]));
        }
        Some(self.items.remove(index))
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut SaleItemForm> {
        self.items.get_mut(index)
    }

    fn tax_rate(&self) -> Option<Percent> {
        (!self.tax_rate.is_blank()).then(|| self.tax_rate.to_percent())
    }

    fn discount(&self) -> Option<Discount> {
        if self.discount_value.is_blank() {
            return None;
        }
        Some(match self.discount_type {
            DiscountType::Fixed => Discount::Fixed(self.discount_value.to_money()),
            DiscountType::Percentage => Discount::Percentage(self.discount_value.to_percent()),
        })
    }

    /// Live totals for whatever is currently typed.
    pub fn preview(&self) -> SaleTotals {
        let items: Vec<SaleItem> = self.items.iter().map(SaleItemForm::to_item).collect();
        calculator::compute_totals(&items, self.tax_rate(), self.discount().as_ref())
    }

    /// Converts the form into a draft ready for validation and saving.
    ///
    /// Rows with neither a name nor a quantity are treated as untouched and
    /// dropped.
    pub fn to_draft(&self) -> CoreResult<MultiItemSaleDraft> {
        let payment_method = self
            .payment_method
            .ok_or_else(|| ValidationError::required("paymentMethod"))?;

        let items = self
            .items
            .iter()
            .filter(|row| !(row.product_name.trim().is_empty() && row.quantity.is_blank()))
            .map(SaleItemForm::to_item)
            .collect();

        let notes = self.notes.trim();

        Ok(MultiItemSaleDraft {
            items,
            tax_rate: self.tax_rate(),
            discount: self.discount(),
            payment_method,
            customer: self.customer.clone(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
