//! # Domain Types
//!
//! Core domain types used throughout Duka.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │                       ┌──────────────────┐                              │
//! │                       │    SaleRecord    │  tagged: "kind"              │
//! │                       └────────┬─────────┘                              │
//! │                 ┌──────────────┴──────────────┐                         │
//! │        ┌────────▼────────┐          ┌─────────▼────────┐                │
//! │        │   SingleSale    │          │  MultiItemSale   │                │
//! │        │  header         │          │  header          │                │
//! │        │  product fields │          │  items[]         │                │
//! │        │  quantity_sold  │          │  subtotal/tax    │                │
//! │        └─────────────────┘          │  discount/profit │                │
//! │                                     └──────────────────┘                │
//! │                                                                         │
//! │  SaleHeader: id, owner_id, timestamp, payment_method, total_amount,    │
//! │              customer, notes, last_modified_at                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! Drafts come in from forms, the core validates them and computes every
//! derived figure, and the storage layer persists the finished record.
//! Edits go through patches which recompute totals and stamp
//! `last_modified_at`. `id` and `timestamp` never change.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::calculator::{self, SaleTotals};
use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, Percent, Quantity};
use crate::validation;

// =============================================================================
// Enumerations
// =============================================================================

/// What a line item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    /// A catalog product (has a `product_id`).
    #[default]
    Product,
    /// An ad-hoc service.
    Service,
    /// Anything else.
    Other,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Product => "PRODUCT",
            SaleType::Service => "SERVICE",
            SaleType::Other => "OTHER",
        }
    }
}

impl FromStr for SaleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PRODUCT" => Ok(SaleType::Product),
            "SERVICE" => Ok(SaleType::Service),
            "OTHER" => Ok(SaleType::Other),
            _ => Err(ValidationError::NotAllowed {
                field: "saleType".to_string(),
                allowed: vec!["PRODUCT".into(), "SERVICE".into(), "OTHER".into()],
            }),
        }
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    /// Mobile money.
    Mpesa,
    BankTransfer,
    Card,
    /// Sold on account, to be paid later.
    Credit,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Mpesa,
        PaymentMethod::BankTransfer,
        PaymentMethod::Card,
        PaymentMethod::Credit,
        PaymentMethod::Cheque,
        PaymentMethod::Other,
    ];

    /// Stored / wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Mpesa => "MPESA",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Credit => "CREDIT",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Accepts the stored spelling case-insensitively, with `-` or space in
    /// place of `_` (`"m-pesa"`, `"bank transfer"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| if c == ' ' { '_' } else { c.to_ascii_uppercase() })
            .collect();

        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item within a multi-item sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Catalog product, `None` for ad-hoc services and other items.
    pub product_id: Option<String>,
    pub product_name: String,
    #[serde(default)]
    pub sale_type: SaleType,
    pub quantity: Quantity,
    /// Price charged per unit.
    pub unit_price: Money,
    /// Acquisition cost per unit; zero when unknown.
    #[serde(default)]
    pub cost_price: Money,
    /// Stored profit. Older records may lack it, use [`SaleItem::profit`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_profit: Option<Money>,
}

impl SaleItem {
    /// Creates a line item with its profit computed.
    pub fn new(
        product_id: Option<String>,
        product_name: impl Into<String>,
        sale_type: SaleType,
        quantity: Quantity,
        unit_price: Money,
        cost_price: Money,
    ) -> Self {
        let mut item = SaleItem {
            product_id,
            product_name: product_name.into(),
            sale_type,
            quantity,
            unit_price,
            cost_price,
            stored_profit: None,
        };
        item.refresh_profit();
        item
    }

    /// Recomputes the stored profit from the line's own figures.
    ///
    /// Items arriving in drafts and patches go through this; only rows loaded
    /// from storage keep the profit they carry.
    pub fn refresh_profit(&mut self) {
        self.stored_profit = Some(calculator::line_profit(
            self.quantity,
            self.unit_price,
            self.cost_price,
        ));
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        calculator::line_total(self.quantity, self.unit_price)
    }

    /// Stored profit, or `quantity × (unit_price − cost_price)` when absent.
    /// May be negative.
    pub fn profit(&self) -> Money {
        self.stored_profit.unwrap_or_else(|| {
            calculator::line_profit(self.quantity, self.unit_price, self.cost_price)
        })
    }
}

// =============================================================================
// Sale Header
// =============================================================================

/// Optional customer details captured at the till.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Fields shared by both sale shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeader {
    /// Immutable once created.
    pub id: String,
    /// Business account the sale belongs to (the effective owner id).
    pub owner_id: String,
    /// Creation instant, millisecond precision. Immutable.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    /// Final amount charged, never negative.
    pub total_amount: Money,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Single-Item Sale
// =============================================================================

/// A one-product transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SingleSale {
    #[serde(flatten)]
    pub header: SaleHeader,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    #[serde(default)]
    pub sale_type: SaleType,
    pub quantity_sold: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_profit: Option<Money>,
}

impl SingleSale {
    /// Builds a fully computed sale from a validated draft.
    pub fn from_draft(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        draft: SingleSaleDraft,
    ) -> CoreResult<Self> {
        validation::validate_single_sale_draft(&draft)?;

        let total_amount = calculator::line_total(draft.quantity, draft.unit_price);
        let profit = calculator::line_profit(draft.quantity, draft.unit_price, draft.cost_price);

        Ok(SingleSale {
            header: SaleHeader {
                id: id.into(),
                owner_id: owner_id.into(),
                timestamp,
                payment_method: draft.payment_method,
                total_amount,
                customer: draft.customer,
                notes: draft.notes,
                last_modified_at: None,
            },
            product_id: draft.product_id,
            product_name: Some(draft.product_name.trim().to_string()),
            sale_type: draft.sale_type,
            quantity_sold: draft.quantity,
            unit_price: draft.unit_price,
            cost_price: draft.cost_price,
            stored_profit: Some(profit),
        })
    }

    /// Stored profit, or `(unit_price − cost_price) × quantity_sold`.
    pub fn profit(&self) -> Money {
        self.stored_profit.unwrap_or_else(|| {
            calculator::line_profit(self.quantity_sold, self.unit_price, self.cost_price)
        })
    }

    /// Applies an edit, recomputing total and profit.
    pub fn apply_patch(&mut self, patch: SingleSalePatch, now: DateTime<Utc>) -> CoreResult<()> {
        let mut next = self.clone();

        if let Some(name) = patch.product_name {
            next.product_name = Some(name.trim().to_string());
        }
        if let Some(quantity) = patch.quantity {
            next.quantity_sold = quantity;
        }
        if let Some(price) = patch.unit_price {
            next.unit_price = price;
        }
        if let Some(cost) = patch.cost_price {
            next.cost_price = cost;
        }
        next.header.apply(patch.payment_method, patch.customer, patch.notes);

        validation::validate_single_sale_fields(
            next.product_name.as_deref().unwrap_or_default(),
            next.quantity_sold,
            next.unit_price,
            next.cost_price,
        )?;

        next.header.total_amount = calculator::line_total(next.quantity_sold, next.unit_price);
        next.stored_profit = Some(calculator::line_profit(
            next.quantity_sold,
            next.unit_price,
            next.cost_price,
        ));
        next.header.last_modified_at = Some(now);

        *self = next;
        Ok(())
    }
}

// =============================================================================
// Multi-Item Sale
// =============================================================================

/// A discount as entered: a fixed amount or a percentage of the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    Fixed(Money),
    Percentage(Percent),
}

impl Discount {
    pub fn discount_type(&self) -> DiscountType {
        match self {
            Discount::Fixed(_) => DiscountType::Fixed,
            Discount::Percentage(_) => DiscountType::Percentage,
        }
    }
}

/// The `discountType` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Fixed,
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Fixed => "FIXED",
            DiscountType::Percentage => "PERCENTAGE",
        }
    }
}

impl FromStr for DiscountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FIXED" => Ok(DiscountType::Fixed),
            "PERCENTAGE" | "PERCENT" => Ok(DiscountType::Percentage),
            _ => Err(ValidationError::NotAllowed {
                field: "discountType".to_string(),
                allowed: vec!["FIXED".into(), "PERCENTAGE".into()],
            }),
        }
    }
}

/// A transaction with one or more line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MultiItemSale {
    #[serde(flatten)]
    pub header: SaleHeader,
    /// Non-empty, in entry order.
    pub items: Vec<SaleItem>,
    /// `Σ line_total`.
    pub subtotal: Money,
    pub tax_rate: Option<Percent>,
    /// Absent when no tax rate applies.
    pub tax: Option<Money>,
    /// The discount as entered.
    pub discount_rule: Option<Discount>,
    /// The discount actually applied, never above `subtotal`.
    pub discount: Option<Money>,
    pub total_profit: Money,
}

impl MultiItemSale {
    /// Builds a fully computed sale from a validated draft.
    pub fn from_draft(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        mut draft: MultiItemSaleDraft,
    ) -> CoreResult<Self> {
        validation::validate_multi_item_sale_draft(&draft)?;
        draft.items.iter_mut().for_each(SaleItem::refresh_profit);

        let totals = calculator::compute_totals(&draft.items, draft.tax_rate, draft.discount.as_ref());

        let mut sale = MultiItemSale {
            header: SaleHeader {
                id: id.into(),
                owner_id: owner_id.into(),
                timestamp,
                payment_method: draft.payment_method,
                total_amount: totals.total,
                customer: draft.customer,
                notes: draft.notes,
                last_modified_at: None,
            },
            items: draft.items,
            subtotal: totals.subtotal,
            tax_rate: draft.tax_rate,
            tax: None,
            discount_rule: draft.discount,
            discount: None,
            total_profit: totals.total_profit,
        };
        sale.store_totals(&totals);
        Ok(sale)
    }

    /// Recomputes totals from the current items, tax rate and discount.
    pub fn totals(&self) -> SaleTotals {
        calculator::compute_totals(&self.items, self.tax_rate, self.discount_rule.as_ref())
    }

    /// Applies an edit, recomputing every derived figure.
    pub fn apply_patch(
        &mut self,
        patch: MultiItemSalePatch,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut next = self.clone();

        if let Some(items) = patch.items {
            next.items = items;
            next.items.iter_mut().for_each(SaleItem::refresh_profit);
        }
        if let Some(rate) = patch.tax_rate {
            next.tax_rate = rate;
        }
        if let Some(discount) = patch.discount {
            next.discount_rule = discount;
        }
        next.header.apply(patch.payment_method, patch.customer, patch.notes);

        validation::validate_sale_items(&next.items)?;

        let totals = next.totals();
        next.store_totals(&totals);
        next.header.last_modified_at = Some(now);

        *self = next;
        Ok(())
    }

    fn store_totals(&mut self, totals: &SaleTotals) {
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.discount = self.discount_rule.map(|_| totals.discount);
        self.header.total_amount = totals.total;
        self.total_profit = totals.total_profit;
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// Either persisted sale shape.
///
/// Every aggregation matches on this tag instead of probing for an `items`
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleRecord {
    Single(SingleSale),
    Multi(MultiItemSale),
}

impl SaleRecord {
    pub fn header(&self) -> &SaleHeader {
        match self {
            SaleRecord::Single(sale) => &sale.header,
            SaleRecord::Multi(sale) => &sale.header,
        }
    }

    pub fn id(&self) -> &str {
        &self.header().id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.header().timestamp
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.header().payment_method
    }

    pub fn total_amount(&self) -> Money {
        self.header().total_amount
    }

    /// Human-readable label, see [`calculator::derive_display_name`].
    pub fn display_name(&self) -> String {
        match self {
            SaleRecord::Single(sale) => calculator::derive_display_name(
                &sale.header.id,
                sale.product_name.as_deref(),
                None,
            ),
            SaleRecord::Multi(sale) => {
                calculator::derive_display_name(&sale.header.id, None, Some(&sale.items))
            }
        }
    }

    pub fn profit(&self) -> Money {
        calculator::aggregate_profit(self)
    }
}

impl From<SingleSale> for SaleRecord {
    fn from(sale: SingleSale) -> Self {
        SaleRecord::Single(sale)
    }
}

impl From<MultiItemSale> for SaleRecord {
    fn from(sale: MultiItemSale) -> Self {
        SaleRecord::Multi(sale)
    }
}

// =============================================================================
// Drafts & Patches
// =============================================================================

/// Fields for creating a single-item sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SingleSaleDraft {
    pub product_id: Option<String>,
    pub product_name: String,
    #[serde(default)]
    pub sale_type: SaleType,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[serde(default)]
    pub cost_price: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub notes: Option<String>,
}

/// Fields for creating a multi-item sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MultiItemSaleDraft {
    pub items: Vec<SaleItem>,
    pub tax_rate: Option<Percent>,
    pub discount: Option<Discount>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub notes: Option<String>,
}

/// An edit to a single-item sale. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SingleSalePatch {
    pub product_name: Option<String>,
    pub quantity: Option<Quantity>,
    pub unit_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub payment_method: Option<PaymentMethod>,
    pub customer: Option<CustomerInfo>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

/// An edit to a multi-item sale. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MultiItemSalePatch {
    pub items: Option<Vec<SaleItem>>,
    /// `Some(None)` removes tax.
    pub tax_rate: Option<Option<Percent>>,
    /// `Some(None)` removes the discount.
    pub discount: Option<Option<Discount>>,
    pub payment_method: Option<PaymentMethod>,
    pub customer: Option<CustomerInfo>,
    pub notes: Option<Option<String>>,
}

impl SaleHeader {
    fn apply(
        &mut self,
        payment_method: Option<PaymentMethod>,
        customer: Option<CustomerInfo>,
        notes: Option<Option<String>>,
    ) {
        if let Some(method) = payment_method {
            self.payment_method = method;
        }
        if let Some(customer) = customer {
            self.customer = customer;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub description: Option<String>,
    pub cost_price: Money,
    pub selling_price: Money,
    /// Units in stock.
    pub quantity: i64,
    pub min_stock_level: i64,
    pub unit_of_measure: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub tags: Option<String>,
    pub is_perishable: bool,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }
}

/// Fields for creating a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    /// Generated at persistence time when absent.
    pub sku: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub cost_price: Money,
    pub selling_price: Money,
    pub quantity: i64,
    pub min_stock_level: i64,
    pub unit_of_measure: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub batch_number: Option<String>,
    pub tags: Option<String>,
    pub is_perishable: bool,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn item(qty: i32, price: i32, cost: i32) -> SaleItem {
        SaleItem::new(
            None,
            "Item",
            SaleType::Product,
            Quantity::from(qty),
            Money::from(price),
            Money::from(cost),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
    }

    fn multi_draft() -> MultiItemSaleDraft {
        MultiItemSaleDraft {
            items: vec![item(2, 100, 60), item(1, 50, 50)],
            tax_rate: Some(Percent::from(16)),
            discount: None,
            payment_method: PaymentMethod::Mpesa,
            customer: CustomerInfo::default(),
            notes: None,
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("M-Pesa".parse::<PaymentMethod>().unwrap(), PaymentMethod::Mpesa);
        assert_eq!(
            "bank transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde_spelling() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"BANK_TRANSFER\"");
    }

    #[test]
    fn test_item_profit_falls_back_to_formula() {
        let mut line = item(3, 10, 4);
        line.stored_profit = None;
        assert_eq!(line.profit(), Money::from(18));
        assert_eq!(line.line_total(), Money::from(30));
    }

    #[test]
    fn test_item_profit_may_be_negative() {
        assert_eq!(item(2, 40, 50).profit(), Money::from(-20));
    }

    #[test]
    fn test_multi_item_sale_from_draft() {
        let sale = MultiItemSale::from_draft("sale-0001", "owner", now(), multi_draft()).unwrap();

        assert_eq!(sale.subtotal, Money::from(250));
        assert_eq!(sale.tax, Some(Money::from(40)));
        assert_eq!(sale.discount, None);
        assert_eq!(sale.header.total_amount, Money::from(290));
        assert_eq!(sale.total_profit, Money::from(80));
        assert!(sale.header.last_modified_at.is_none());
    }

    #[test]
    fn test_multi_item_sale_ignores_client_profit() {
        let mut draft = multi_draft();
        draft.items[0].stored_profit = Some(Money::from(999));

        let sale = MultiItemSale::from_draft("sale-0001", "owner", now(), draft).unwrap();
        assert_eq!(sale.items[0].stored_profit, Some(Money::from(80)));
        assert_eq!(sale.total_profit, Money::from(80));

        let mut repriced = sale.items.clone();
        repriced[0].unit_price = Money::from(120);
        let mut sale = sale;
        sale.apply_patch(
            MultiItemSalePatch {
                items: Some(repriced),
                ..Default::default()
            },
            now(),
        )
        .unwrap();

        assert_eq!(sale.items[0].profit(), Money::from(120));
        assert_eq!(sale.total_profit, Money::from(120));
    }

    #[test]
    fn test_draft_json_with_negative_quantity_is_rejected() {
        let json = r#"{
            "productId": null,
            "productName": "Sugar",
            "quantity": "-2",
            "unitPrice": "100",
            "paymentMethod": "CASH",
            "notes": null
        }"#;
        assert!(serde_json::from_str::<SingleSaleDraft>(json).is_err());

        let json = r#"{
            "items": [],
            "taxRate": "-16",
            "discount": null,
            "paymentMethod": "CASH",
            "notes": null
        }"#;
        assert!(serde_json::from_str::<MultiItemSaleDraft>(json).is_err());

        let json = r#"{
            "productId": null,
            "productName": "Sugar",
            "quantity": "2",
            "unitPrice": "100",
            "paymentMethod": "CASH",
            "notes": null
        }"#;
        let draft: SingleSaleDraft = serde_json::from_str(json).unwrap();
        let sale = SingleSale::from_draft("sale-0002", "owner", now(), draft).unwrap();
        assert_eq!(sale.header.total_amount, Money::from(200));
    }

    #[test]
    fn test_multi_item_sale_rejects_empty_items() {
        let mut draft = multi_draft();
        draft.items.clear();
        assert!(MultiItemSale::from_draft("id", "owner", now(), draft).is_err());
    }

    #[test]
    fn test_multi_item_patch_recomputes_and_stamps() {
        let mut sale = MultiItemSale::from_draft("sale-0001", "owner", now(), multi_draft()).unwrap();
        let later = now() + chrono::Duration::minutes(5);

        sale.apply_patch(
            MultiItemSalePatch {
                tax_rate: Some(None),
                discount: Some(Some(Discount::Percentage(Percent::from(10)))),
                ..Default::default()
            },
            later,
        )
        .unwrap();

        assert_eq!(sale.tax, None);
        assert_eq!(sale.discount, Some(Money::from(25)));
        assert_eq!(sale.header.total_amount, Money::from(225));
        assert_eq!(sale.header.last_modified_at, Some(later));
        assert_eq!(sale.header.timestamp, now());
        assert_eq!(sale.header.id, "sale-0001");
    }

    #[test]
    fn test_failed_patch_leaves_sale_untouched() {
        let mut sale = MultiItemSale::from_draft("sale-0001", "owner", now(), multi_draft()).unwrap();
        let before = sale.clone();

        let result = sale.apply_patch(
            MultiItemSalePatch {
                items: Some(vec![]),
                ..Default::default()
            },
            now(),
        );

        assert!(result.is_err());
        assert_eq!(sale, before);
    }

    #[test]
    fn test_single_sale_patch() {
        let draft = SingleSaleDraft {
            product_id: Some("p1".into()),
            product_name: "Rice 2kg".into(),
            sale_type: SaleType::Product,
            quantity: Quantity::new(dec!(1.5)).unwrap(),
            unit_price: Money::from(200),
            cost_price: Money::from(150),
            payment_method: PaymentMethod::Cash,
            customer: CustomerInfo::default(),
            notes: Some("first".into()),
        };
        let mut sale = SingleSale::from_draft("abc-9876", "owner", now(), draft).unwrap();
        assert_eq!(sale.header.total_amount, Money::from(300));
        assert_eq!(sale.profit(), Money::from(75));

        sale.apply_patch(
            SingleSalePatch {
                quantity: Some(Quantity::from(2)),
                notes: Some(None),
                ..Default::default()
            },
            now(),
        )
        .unwrap();

        assert_eq!(sale.header.total_amount, Money::from(400));
        assert_eq!(sale.profit(), Money::from(100));
        assert_eq!(sale.header.notes, None);
    }

    #[test]
    fn test_sale_record_json_is_tagged() {
        let sale = MultiItemSale::from_draft("sale-0001", "owner", now(), multi_draft()).unwrap();
        let record = SaleRecord::from(sale);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "multi");
        assert_eq!(json["id"], "sale-0001");
        assert_eq!(json["paymentMethod"], "MPESA");

        let back: SaleRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_low_stock() {
        let product = Product {
            id: "p".into(),
            owner_id: "o".into(),
            name: "Soap".into(),
            sku: "SOAP".into(),
            category: "Household".into(),
            description: None,
            cost_price: Money::from(10),
            selling_price: Money::from(15),
            quantity: 5,
            min_stock_level: 5,
            unit_of_measure: "pcs".into(),
            supplier: None,
            location: None,
            barcode: None,
            batch_number: None,
            tags: None,
            is_perishable: false,
            expiry_date: None,
            created_at: now(),
            updated_at: now(),
        };
        assert!(product.is_low_stock());
    }
}
