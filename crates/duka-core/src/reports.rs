//! # Sales Reports
//!
//! Dashboard rollups over historical sale records of both shapes.
//!
//! ## Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  now = Wed 2026-03-18 14:30 (local)                                     │
//! │                                                                         │
//! │  today      [Wed 00:00 ────────────────────── now]                      │
//! │  this week  [Sun 2026-03-15 00:00 ─────────── now]                      │
//! │  this month [Sun 2026-03-01 00:00 ─────────── now]                      │
//! │                                                                         │
//! │  Both bounds inclusive. Windows are derived from `now` on every call,   │
//! │  nothing is cached.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::calculator;
use crate::money::{Money, Quantity};
use crate::types::{PaymentMethod, Product, SaleRecord};

// =============================================================================
// Date Windows
// =============================================================================

/// An inclusive `[start, end]` instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateWindow { start, end }
    }

    /// From local midnight today until `now`.
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::since(now, now.date_naive())
    }

    /// From local midnight of the most recent Sunday until `now`.
    pub fn this_week<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        let back = u64::from(now.weekday().num_days_from_sunday());
        Self::since(now, today.checked_sub_days(Days::new(back)).unwrap_or(today))
    }

    /// From local midnight on the first of the month until `now`.
    pub fn this_month<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        Self::since(now, today.with_day(1).unwrap_or(today))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    fn since<Tz: TimeZone>(now: &DateTime<Tz>, day: NaiveDate) -> Self {
        let midnight = day.and_time(chrono::NaiveTime::MIN);
        // A DST gap at midnight has no local instant; fall back to UTC midnight.
        let start = now
            .timezone()
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));

        DateWindow {
            start,
            end: now.with_timezone(&Utc),
        }
    }
}

/// Sales whose timestamp falls in `[start, end]`, in input order.
pub fn filter_by_date_range<'a, I>(
    sales: I,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'a SaleRecord>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let window = DateWindow::new(start, end);
    sales
        .into_iter()
        .filter(|sale| window.contains(sale.timestamp()))
        .collect()
}

// =============================================================================
// Summaries
// =============================================================================

/// Count, revenue and profit of a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub count: usize,
    pub revenue: Money,
    pub profit: Money,
}

impl SalesSummary {
    fn add(&mut self, sale: &SaleRecord) {
        self.count += 1;
        self.revenue += sale.total_amount();
        self.profit += calculator::aggregate_profit(sale);
    }
}

pub fn summarize<'a, I>(sales: I) -> SalesSummary
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut summary = SalesSummary::default();
    for sale in sales {
        summary.add(sale);
    }
    summary
}

/// Summary for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub summary: SalesSummary,
}

/// Per-payment-method summaries in first-seen order.
pub fn payment_breakdown<'a, I>(sales: I) -> Vec<PaymentBreakdown>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut rows: Vec<PaymentBreakdown> = Vec::new();
    for sale in sales {
        let method = sale.payment_method();
        match rows.iter_mut().find(|row| row.method == method) {
            Some(row) => row.summary.add(sale),
            None => {
                let mut summary = SalesSummary::default();
                summary.add(sale);
                rows.push(PaymentBreakdown { method, summary });
            }
        }
    }
    rows
}

/// Catalog products at or below their reorder level.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

// =============================================================================
// Top Products
// =============================================================================

/// A catalog product with its sales volume over some window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RankedProduct {
    pub product_id: String,
    pub name: String,
    pub quantity_sold: Quantity,
    pub revenue: Money,
}

/// Ranks products by quantity sold, highest first.
///
/// Quantities and revenue are accumulated per `product_id` across single
/// sales and multi-sale items. Ids with no catalog entry (deleted products)
/// are dropped. Ties keep first-seen order.
pub fn rank_top_products<'a, I>(sales: I, products: &[Product], limit: usize) -> Vec<RankedProduct>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut order: Vec<(&'a str, Quantity, Money)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    let mut record = |id: &'a str, quantity: Quantity, revenue: Money| {
        let slot = *index.entry(id).or_insert_with(|| {
            order.push((id, Quantity::zero(), Money::zero()));
            order.len() - 1
        });
        order[slot].1 += quantity;
        order[slot].2 += revenue;
    };

    for sale in sales {
        match sale {
            SaleRecord::Single(sale) => {
                if let Some(id) = sale.product_id.as_deref() {
                    let revenue = calculator::line_total(sale.quantity_sold, sale.unit_price);
                    record(id, sale.quantity_sold, revenue);
                }
            }
            SaleRecord::Multi(sale) => {
                for item in &sale.items {
                    if let Some(id) = item.product_id.as_deref() {
                        record(id, item.quantity, item.line_total());
                    }
                }
            }
        }
    }

    let catalog: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut ranked: Vec<RankedProduct> = order
        .into_iter()
        .filter_map(|(id, quantity_sold, revenue)| {
            catalog.get(id).map(|product| RankedProduct {
                product_id: id.to_string(),
                name: product.name.clone(),
                quantity_sold,
                revenue,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Dashboard
// =============================================================================

/// Everything the dashboard header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today: SalesSummary,
    pub week: SalesSummary,
    pub month: SalesSummary,
    /// Ranked over this week.
    pub top_products: Vec<RankedProduct>,
}

pub fn dashboard<Tz: TimeZone>(
    sales: &[SaleRecord],
    products: &[Product],
    now: &DateTime<Tz>,
    top_limit: usize,
) -> DashboardSummary {
    let in_window = |window: DateWindow| filter_by_date_range(sales, window.start, window.end);

    let week_sales = in_window(DateWindow::this_week(now));

    DashboardSummary {
        today: summarize(in_window(DateWindow::today(now))),
        week: summarize(week_sales.iter().copied()),
        month: summarize(in_window(DateWindow::this_month(now))),
        top_products: rank_top_products(week_sales, products, top_limit),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
