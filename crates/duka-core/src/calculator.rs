//! # Sale Calculator
//!
//! Line, tax, discount, total and profit arithmetic for both sale shapes,
//! plus the human-readable sale label.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Multi-Item Sale Totals                              │
//! │                                                                         │
//! │   items ──► Σ quantity × unit_price ──► subtotal                        │
//! │                                            │                            │
//! │                        ┌───────────────────┼───────────────────┐        │
//! │                        ▼                   │                   ▼        │
//! │              tax = subtotal × rate%        │     discount = FIXED amount │
//! │              (absent if no rate)           │             or subtotal × % │
//! │                        │                   │       clamped to subtotal  │
//! │                        └─────────┬─────────┴─────────┬─────────┘        │
//! │                                  ▼                   ▼                  │
//! │                  total = max(0, subtotal + tax − discount)              │
//! │                                                                         │
//! │   items ──► Σ quantity × (unit_price − cost_price) ──► total_profit     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here rounds. Rounding happens once, at display time
//! (see [`crate::locale`]), so aggregates never accumulate rounding error.
//!
//! Every function is total: inputs arrive as validated `Money` / `Quantity` /
//! `Percent` values and out-of-range amounts are clamped, never rejected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percent, Quantity};
use crate::types::{Discount, SaleItem, SaleRecord};
use crate::SHORT_ID_LEN;

// =============================================================================
// Line Arithmetic
// =============================================================================

/// `quantity × unit_price`, unrounded.
///
/// A negative price is treated as zero so the result is never negative.
#[inline]
pub fn line_total(quantity: Quantity, unit_price: Money) -> Money {
    unit_price.clamp_non_negative() * quantity
}

/// `quantity × (unit_price − cost_price)`. May be negative.
#[inline]
pub fn line_profit(quantity: Quantity, unit_price: Money, cost_price: Money) -> Money {
    (unit_price.clamp_non_negative() - cost_price.clamp_non_negative()) * quantity
}

// =============================================================================
// Tax, Discount, Total
// =============================================================================

/// `subtotal × rate / 100`, zero when no rate is given.
pub fn calculate_tax(subtotal: Money, tax_rate: Option<Percent>) -> Money {
    tax_rate.map(|rate| rate.of(subtotal)).unwrap_or_default()
}

/// Tax as it appears on a receipt.
///
/// `None` when the rate is absent or zero: tax is "not applicable" rather
/// than "applicable at zero".
pub fn tax_line(subtotal: Money, tax_rate: Option<Percent>) -> Option<Money> {
    match tax_rate {
        Some(rate) if !rate.is_zero() => Some(rate.of(subtotal)),
        _ => None,
    }
}

/// Discount amount for a subtotal, clamped to `[0, subtotal]` for both kinds.
pub fn calculate_discount(subtotal: Money, discount: &Discount) -> Money {
    let ceiling = subtotal.clamp_non_negative();
    let amount = match discount {
        Discount::Fixed(amount) => *amount,
        Discount::Percentage(percent) => percent.of(subtotal),
    };
    amount.clamp_non_negative().min(ceiling)
}

/// `max(0, subtotal + tax − discount)`.
pub fn calculate_total(subtotal: Money, tax: Money, discount: Money) -> Money {
    (subtotal + tax - discount).clamp_non_negative()
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Every derived figure of a multi-item sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    /// `None` when tax does not apply.
    pub tax: Option<Money>,
    pub discount: Money,
    pub total: Money,
    pub total_profit: Money,
}

/// Computes subtotal, tax, discount, total and profit for a set of items.
///
/// Used both for the live form preview and for the record that gets stored,
/// so the two can never disagree.
pub fn compute_totals(
    items: &[SaleItem],
    tax_rate: Option<Percent>,
    discount: Option<&Discount>,
) -> SaleTotals {
    let subtotal: Money = items.iter().map(SaleItem::line_total).sum();
    let tax = tax_line(subtotal, tax_rate);
    let discount = discount
        .map(|d| calculate_discount(subtotal, d))
        .unwrap_or_default();
    let total = calculate_total(subtotal, tax.unwrap_or_default(), discount);
    let total_profit = items.iter().map(SaleItem::profit).sum();

    SaleTotals {
        subtotal,
        tax,
        discount,
        total,
        total_profit,
    }
}

// =============================================================================
// Profit Aggregation
// =============================================================================

/// Profit of a stored sale of either shape.
///
/// Single sales use their stored profit (or the line formula); multi-item
/// sales sum their items the same way.
pub fn aggregate_profit(sale: &SaleRecord) -> Money {
    match sale {
        SaleRecord::Single(sale) => sale.profit(),
        SaleRecord::Multi(sale) => sale.items.iter().map(SaleItem::profit).sum(),
    }
}

// =============================================================================
// Display Name
// =============================================================================

/// Last [`SHORT_ID_LEN`] characters of a sale id.
pub fn short_id(sale_id: &str) -> &str {
    match sale_id.char_indices().rev().nth(SHORT_ID_LEN - 1) {
        Some((idx, _)) => &sale_id[idx..],
        None => sale_id,
    }
}

/// Human label for a sale, e.g. `Sale #a1b2 – Sugar 1kg + 2 more items`.
///
/// Multi-item sales pass their `items`; single sales pass `product_name`.
/// Deterministic for identical inputs.
pub fn derive_display_name(
    sale_id: &str,
    product_name: Option<&str>,
    items: Option<&[SaleItem]>,
) -> String {
    let short = short_id(sale_id);

    match items {
        Some([first, rest @ ..]) => {
            let mut name = format!("Sale #{} – {}", short, first.product_name);
            if !rest.is_empty() {
                name.push_str(&format!(" + {} more items", rest.len()));
            }
            name
        }
        _ => format!("Sale #{} – {}", short, product_name.unwrap_or("Unknown")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleType;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(name: &str, qty: i32, price: i32, cost: i32) -> SaleItem {
        SaleItem::new(
            None,
            name,
            SaleType::Product,
            Quantity::from(qty),
            Money::from(price),
            Money::from(cost),
        )
    }

    #[test]
    fn test_scenario_two_items_with_tax() {
        let items = vec![item("A", 2, 100, 60), item("B", 1, 50, 50)];

        let totals = compute_totals(&items, Some(Percent::from(16)), None);

        assert_eq!(totals.subtotal, Money::from(250));
        assert_eq!(totals.tax, Some(Money::from(40)));
        assert_eq!(totals.discount, Money::zero());
        assert_eq!(totals.total, Money::from(290));
        assert_eq!(totals.total_profit, Money::from(80));
    }

    #[test]
    fn test_line_total_is_unrounded() {
        let qty = Quantity::new(dec!(0.333)).unwrap();
        let total = line_total(qty, Money::new(dec!(10.01)));
        assert_eq!(total.amount(), dec!(3.33333));
    }

    #[test]
    fn test_line_total_negative_price_is_zero() {
        assert_eq!(line_total(Quantity::from(3), Money::from(-5)), Money::zero());
    }

    #[test]
    fn test_tax_not_applicable() {
        let subtotal = Money::from(100);
        assert_eq!(tax_line(subtotal, None), None);
        assert_eq!(tax_line(subtotal, Some(Percent::zero())), None);
        assert_eq!(calculate_tax(subtotal, None), Money::zero());
        assert_eq!(calculate_tax(subtotal, Some(Percent::from(8))), Money::from(8));
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let subtotal = Money::from(100);
        assert_eq!(
            calculate_discount(subtotal, &Discount::Fixed(Money::from(30))),
            Money::from(30)
        );
        assert_eq!(
            calculate_discount(subtotal, &Discount::Fixed(Money::from(500))),
            subtotal
        );
        assert_eq!(
            calculate_discount(subtotal, &Discount::Fixed(Money::from(-10))),
            Money::zero()
        );
    }

    #[test]
    fn test_percentage_discount_clamped_to_subtotal() {
        let subtotal = Money::from(80);
        assert_eq!(
            calculate_discount(subtotal, &Discount::Percentage(Percent::from(25))),
            Money::from(20)
        );
        assert_eq!(
            calculate_discount(subtotal, &Discount::Percentage(Percent::from(150))),
            subtotal
        );
    }

    #[test]
    fn test_total_never_negative() {
        assert_eq!(
            calculate_total(Money::from(10), Money::zero(), Money::from(50)),
            Money::zero()
        );
    }

    #[test]
    fn test_display_name_multi_item() {
        let items = vec![
            item("Sugar 1kg", 1, 10, 5),
            item("Salt", 1, 10, 5),
            item("Tea", 1, 10, 5),
        ];
        assert_eq!(
            derive_display_name("sale-xyz-a1b2", None, Some(&items)),
            "Sale #a1b2 – Sugar 1kg + 2 more items"
        );
        assert_eq!(
            derive_display_name("sale-xyz-a1b2", None, Some(&items[..1])),
            "Sale #a1b2 – Sugar 1kg"
        );
    }

    #[test]
    fn test_display_name_single_item() {
        assert_eq!(
            derive_display_name("abcdef", Some("Bread"), None),
            "Sale #cdef – Bread"
        );
        assert_eq!(derive_display_name("abcdef", None, None), "Sale #cdef – Unknown");
        assert_eq!(derive_display_name("ab", None, Some(&[])), "Sale #ab – Unknown");
    }

    #[test]
    fn test_short_id_respects_char_boundaries() {
        assert_eq!(short_id("id-ñandú"), "andú");
        assert_eq!(short_id("xy"), "xy");
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn money() -> impl Strategy<Value = Money> {
        (0i64..10_000_000).prop_map(|cents| Money::new(Decimal::new(cents, 2)))
    }

    fn quantity() -> impl Strategy<Value = Quantity> {
        (0i64..100_000).prop_map(|milli| Quantity::coerce(Decimal::new(milli, 3)))
    }

    fn sale_item() -> impl Strategy<Value = SaleItem> {
        (quantity(), money(), money()).prop_map(|(qty, price, cost)| {
            SaleItem::new(None, "Item", SaleType::Product, qty, price, cost)
        })
    }

    fn discount() -> impl Strategy<Value = Discount> {
        prop_oneof![
            money().prop_map(Discount::Fixed),
            (0i64..50_000).prop_map(|p| Discount::Percentage(Percent::coerce(Decimal::new(p, 2)))),
        ]
    }

    proptest! {
        #[test]
        fn prop_line_total_is_product(qty in quantity(), price in money()) {
            prop_assert_eq!(line_total(qty, price).amount(), qty.value() * price.amount());
        }

        #[test]
        fn prop_line_total_scales(qty in quantity(), price in money()) {
            prop_assert_eq!(
                line_total(qty + qty, price),
                line_total(qty, price) + line_total(qty, price)
            );
        }

        #[test]
        fn prop_total_never_negative(
            subtotal in money(),
            tax in money(),
            d in discount(),
        ) {
            let applied = calculate_discount(subtotal, &d);
            prop_assert!(applied <= subtotal);
            prop_assert!(!calculate_total(subtotal, tax, applied).is_negative());
        }

        #[test]
        fn prop_fixed_discount_never_exceeds_subtotal(subtotal in money(), amount in money()) {
            prop_assert!(calculate_discount(subtotal, &Discount::Fixed(amount)) <= subtotal);
        }

        #[test]
        fn prop_sums_match_totals(items in prop::collection::vec(sale_item(), 1..20)) {
            let totals = compute_totals(&items, None, None);
            let lines: Money = items.iter().map(SaleItem::line_total).sum();
            let profit: Money = items.iter().map(SaleItem::profit).sum();
            prop_assert_eq!(totals.subtotal, lines);
            prop_assert_eq!(totals.total_profit, profit);
        }

        #[test]
        fn prop_display_name_deterministic(
            id in "[a-z0-9-]{1,20}",
            items in prop::collection::vec(sale_item(), 2..6),
        ) {
            let first = derive_display_name(&id, None, Some(&items));
            let second = derive_display_name(&id, None, Some(&items));
            prop_assert_eq!(&first, &second);
            prop_assert!(first.contains("more item"));
        }
    }
}
