//! `duka report`: the dashboard, printed.
//!
//! Windows are computed in the shop's configured UTC offset, so "today"
//! starts at the shop's midnight rather than UTC's.

use clap::Args;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Write};
use tracing::warn;

use duka_core::locale::Currency;
use duka_core::reports::{
    dashboard, filter_by_date_range, low_stock, payment_breakdown, DashboardSummary, DateWindow,
    PaymentBreakdown, SalesSummary,
};
use duka_core::{Product, SaleRecord};

use super::open_database;
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Number of products to rank (overrides configuration)
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

pub async fn run(config: &AppConfig, args: ReportArgs) -> anyhow::Result<()> {
    let db = open_database(config).await?;

    let records = db.sale_records(&config.owner_id, config.history_limit).await?;
    let products = db.products().get_products(&config.owner_id).await?;
    db.close().await;

    let now = Utc::now().with_timezone(&config.offset());
    let top = args.top.unwrap_or(config.top_products).max(1);
    let report = Report::build(&records, &products, &now, top, config.history_limit as usize);
    if let Some(limit) = report.truncated_at {
        warn!(owner_id = %config.owner_id, limit, "Sale history limit reached inside this month");
    }

    let mut out = String::new();
    report.render(&config.currency(), &mut out)?;
    print!("{}", out);

    Ok(())
}

/// Everything the report prints, computed up front.
pub(crate) struct Report<'a> {
    dashboard: DashboardSummary,
    /// Payment mix over this month.
    payments: Vec<PaymentBreakdown>,
    low_stock: Vec<&'a Product>,
    /// Set to the history limit when the loaded sales stop inside this month.
    truncated_at: Option<usize>,
}

impl<'a> Report<'a> {
    pub(crate) fn build<Tz: TimeZone>(
        records: &[SaleRecord],
        products: &'a [Product],
        now: &DateTime<Tz>,
        top: usize,
        history_limit: usize,
    ) -> Self {
        let month = DateWindow::this_month(now);

        // Records arrive newest first; a full page whose oldest entry is still
        // in this month means earlier sales of the month were not loaded.
        let truncated_at = (records.len() >= history_limit
            && records.last().is_some_and(|oldest| oldest.timestamp() >= month.start))
        .then_some(history_limit);

        Report {
            dashboard: dashboard(records, products, now, top),
            payments: payment_breakdown(filter_by_date_range(records, month.start, month.end)),
            low_stock: low_stock(products),
            truncated_at,
        }
    }

    pub(crate) fn render(&self, currency: &Currency, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "Sales")?;
        for (label, summary) in [
            ("Today", &self.dashboard.today),
            ("This week", &self.dashboard.week),
            ("This month", &self.dashboard.month),
        ] {
            writeln!(out, "  {:<12}{}", label, summary_text(summary, currency))?;
        }
        if let Some(limit) = self.truncated_at {
            writeln!(
                out,
                "  (only the latest {} sales were loaded; figures may be undercounted)",
                limit
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Top products this week")?;
        if self.dashboard.top_products.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for (rank, product) in self.dashboard.top_products.iter().enumerate() {
            writeln!(
                out,
                "  {}. {}  x{}  {}",
                rank + 1,
                product.name,
                product.quantity_sold,
                currency.format(product.revenue)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Payment methods this month")?;
        if self.payments.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for entry in &self.payments {
            writeln!(
                out,
                "  {:<14}{}",
                entry.method.as_str(),
                summary_text(&entry.summary, currency)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Low stock")?;
        if self.low_stock.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for product in &self.low_stock {
            writeln!(
                out,
                "  {} ({}): {} {} left, restock at {}",
                product.name,
                product.sku,
                product.quantity,
                product.unit_of_measure,
                product.min_stock_level
            )?;
        }

        Ok(())
    }
}

fn summary_text(summary: &SalesSummary, currency: &Currency) -> String {
    format!(
        "{} sales  {}  profit {}",
        summary.count,
        currency.format(summary.revenue),
        currency.format(summary.profit)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use duka_core::{
        CustomerInfo, Money, PaymentMethod, Quantity, SaleType, SingleSale, SingleSaleDraft,
    };

    fn product(id: &str, name: &str, quantity: i64, min: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            owner_id: "owner".into(),
            name: name.into(),
            sku: format!("SKU-{}", id),
            category: "Groceries".into(),
            description: None,
            cost_price: Money::from(100),
            selling_price: Money::from(150),
            quantity,
            min_stock_level: min,
            unit_of_measure: "pcs".into(),
            supplier: None,
            location: None,
            barcode: None,
            batch_number: None,
            tags: None,
            is_perishable: false,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(id: &str, at: DateTime<Utc>, method: PaymentMethod) -> SaleRecord {
        SingleSale::from_draft(
            id,
            "owner",
            at,
            SingleSaleDraft {
                product_id: Some("p1".into()),
                product_name: "Sugar".into(),
                sale_type: SaleType::Product,
                quantity: Quantity::from(2),
                unit_price: Money::from(1500),
                cost_price: Money::from(1000),
                payment_method: method,
                customer: CustomerInfo::default(),
                notes: None,
            },
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_render_report() {
        let eat = FixedOffset::east_opt(3 * 3600).unwrap();
        // Wednesday 2026-03-18 12:00 EAT
        let now = eat.with_ymd_and_hms(2026, 3, 18, 12, 0, 0).unwrap();
        let today = now.with_timezone(&Utc) - chrono::Duration::hours(1);
        let last_month = now.with_timezone(&Utc) - chrono::Duration::days(30);

        let products = vec![product("p1", "Sugar", 40, 10), product("p2", "Rice", 3, 10)];
        let records = vec![
            sale("s1", today, PaymentMethod::Mpesa),
            sale("s2", last_month, PaymentMethod::Cash),
        ];

        let report = Report::build(&records, &products, &now, 5, 100);
        let mut out = String::new();
        report.render(&Currency::from_code("KES"), &mut out).unwrap();

        assert!(out.contains("Today       1 sales  KSh 3,000.00  profit KSh 1,000.00"));
        assert!(out.contains("1. Sugar  x2  KSh 3,000.00"));
        assert!(out.contains("MPESA"));
        assert!(!out.contains("CASH"));
        assert!(out.contains("Rice (SKU-p2): 3 pcs left, restock at 10"));
        assert!(!out.contains("Sugar (SKU-p1)"));
        assert!(!out.contains("undercounted"));
    }

    #[test]
    fn test_render_flags_history_cut_inside_month() {
        let eat = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = eat.with_ymd_and_hms(2026, 3, 18, 12, 0, 0).unwrap();
        let base = now.with_timezone(&Utc);
        let records: Vec<SaleRecord> = (0..3)
            .map(|i| sale(&format!("s{}", i), base - chrono::Duration::hours(i), PaymentMethod::Cash))
            .collect();

        let report = Report::build(&records, &[], &now, 5, 3);
        let mut out = String::new();
        report.render(&Currency::default(), &mut out).unwrap();
        assert!(out.contains("(only the latest 3 sales were loaded; figures may be undercounted)"));

        // The same page ending before the month began is complete for every window.
        let mut older = records.clone();
        older.push(sale("s9", base - chrono::Duration::days(40), PaymentMethod::Cash));
        let report = Report::build(&older, &[], &now, 5, 4);
        let mut out = String::new();
        report.render(&Currency::default(), &mut out).unwrap();
        assert!(!out.contains("undercounted"));
    }

    #[test]
    fn test_render_empty_report() {
        let now = Utc::now();
        let report = Report::build(&[], &[], &now, 5, 100);
        let mut out = String::new();
        report.render(&Currency::default(), &mut out).unwrap();

        assert!(out.contains("0 sales  KSh 0.00  profit KSh 0.00"));
        assert_eq!(out.matches("(none)").count(), 3);
    }
}
