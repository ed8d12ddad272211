//! # Multi-Item Sale Repository
//!
//! Sales with several line items, tax and an optional discount.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  multi_item_sales (1) ──────────────► (N) sale_items                    │
//! │  ├── envelope (owner, timestamp, payment, customer, notes)              │
//! │  ├── subtotal / tax_rate / tax                                          │
//! │  ├── discount_type + discount_value  (the rule)                         │
//! │  ├── discount                        (the applied amount)               │
//! │  └── total_amount / total_profit                                        │
//! │                                                                         │
//! │  sale_items keyed by (sale_id, position): order is preserved.           │
//! │  Header and items are always written in one transaction.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use duka_core::{
    CustomerInfo, Discount, DiscountType, MultiItemSale, MultiItemSaleDraft, MultiItemSalePatch,
    Percent, SaleHeader, SaleItem,
};

use super::{
    decimal, instant, money, now_millis, opt_instant, opt_money, opt_percent, parse_enum, quantity,
};
use crate::error::{DbError, DbResult};

/// Repository for multi-item sales.
#[derive(Debug, Clone)]
pub struct MultiItemSaleRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct MultiItemSaleRow {
    id: String,
    owner_id: String,
    timestamp: i64,
    payment_method: String,
    total_amount: String,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_email: Option<String>,
    notes: Option<String>,
    last_modified_at: Option<i64>,
    subtotal: String,
    tax_rate: Option<String>,
    tax: Option<String>,
    discount_type: Option<String>,
    discount_value: Option<String>,
    discount: Option<String>,
    total_profit: String,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    product_id: Option<String>,
    product_name: String,
    sale_type: String,
    quantity: String,
    unit_price: String,
    cost_price: String,
    profit: Option<String>,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = DbError;

    fn try_from(row: SaleItemRow) -> DbResult<Self> {
        Ok(SaleItem {
            sale_type: parse_enum("sale_items.sale_type", &row.sale_type)?,
            quantity: quantity("sale_items.quantity", &row.quantity)?,
            unit_price: money("sale_items.unit_price", &row.unit_price)?,
            cost_price: money("sale_items.cost_price", &row.cost_price)?,
            stored_profit: opt_money("sale_items.profit", row.profit.as_deref())?,
            product_id: row.product_id,
            product_name: row.product_name,
        })
    }
}

impl MultiItemSaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> DbResult<MultiItemSale> {
        let discount_rule = discount_rule(self.discount_type.as_deref(), self.discount_value.as_deref())?;

        Ok(MultiItemSale {
            header: SaleHeader {
                timestamp: instant("multi_item_sales.timestamp", self.timestamp)?,
                payment_method: parse_enum("multi_item_sales.payment_method", &self.payment_method)?,
                total_amount: money("multi_item_sales.total_amount", &self.total_amount)?,
                last_modified_at: opt_instant(
                    "multi_item_sales.last_modified_at",
                    self.last_modified_at,
                )?,
                customer: CustomerInfo {
                    name: self.customer_name,
                    phone: self.customer_phone,
                    email: self.customer_email,
                },
                id: self.id,
                owner_id: self.owner_id,
                notes: self.notes,
            },
            items,
            subtotal: money("multi_item_sales.subtotal", &self.subtotal)?,
            tax_rate: opt_percent("multi_item_sales.tax_rate", self.tax_rate.as_deref())?,
            tax: opt_money("multi_item_sales.tax", self.tax.as_deref())?,
            discount_rule,
            discount: opt_money("multi_item_sales.discount", self.discount.as_deref())?,
            total_profit: money("multi_item_sales.total_profit", &self.total_profit)?,
        })
    }
}

/// Rebuilds the discount rule from its type and value columns.
///
/// Both columns are NULL for a sale without a discount.
fn discount_rule(kind: Option<&str>, value: Option<&str>) -> DbResult<Option<Discount>> {
    let (kind, value) = match (kind, value) {
        (None, None) => return Ok(None),
        (Some(kind), Some(value)) => (kind, value),
        (kind, value) => {
            return Err(DbError::corrupt(
                "multi_item_sales.discount_type",
                format!("{:?}/{:?}", kind, value),
            ))
        }
    };

    let column = "multi_item_sales.discount_value";
    let rule = match parse_enum::<DiscountType>("multi_item_sales.discount_type", kind)? {
        DiscountType::Fixed => Discount::Fixed(money(column, value)?),
        DiscountType::Percentage => Discount::Percentage(
            Percent::new(decimal(column, value)?).ok_or_else(|| DbError::corrupt(column, value))?,
        ),
    };
    Ok(Some(rule))
}

fn discount_columns(rule: Option<&Discount>) -> (Option<&'static str>, Option<String>) {
    match rule {
        None => (None, None),
        Some(rule) => {
            let value = match rule {
                Discount::Fixed(amount) => amount.amount(),
                Discount::Percentage(rate) => rate.value(),
            };
            (Some(rule.discount_type().as_str()), Some(value.to_string()))
        }
    }
}

const SELECT_MULTI_ITEM_SALE: &str = r#"
    SELECT
        id, owner_id, timestamp, payment_method, total_amount,
        customer_name, customer_phone, customer_email, notes, last_modified_at,
        subtotal, tax_rate, tax, discount_type, discount_value, discount, total_profit
    FROM multi_item_sales
"#;

impl MultiItemSaleRepository {
    /// Creates a new MultiItemSaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MultiItemSaleRepository { pool }
    }

    /// Records a multi-item sale and its items atomically.
    ///
    /// ## Errors
    /// - `Validation` if the draft has no items or too many
    pub async fn create_multi_item_sale(
        &self,
        owner_id: &str,
        draft: MultiItemSaleDraft,
    ) -> DbResult<MultiItemSale> {
        let sale =
            MultiItemSale::from_draft(Uuid::new_v4().to_string(), owner_id, now_millis(), draft)?;

        debug!(
            id = %sale.header.id,
            items = sale.items.len(),
            total = %sale.header.total_amount,
            "Inserting multi-item sale"
        );

        let mut tx = self.pool.begin().await?;
        let (discount_type, discount_value) = discount_columns(sale.discount_rule.as_ref());

        sqlx::query(
            r#"
            INSERT INTO multi_item_sales (
                id, owner_id, timestamp, payment_method, total_amount,
                customer_name, customer_phone, customer_email, notes, last_modified_at,
                subtotal, tax_rate, tax, discount_type, discount_value, discount, total_profit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&sale.header.id)
        .bind(&sale.header.owner_id)
        .bind(sale.header.timestamp.timestamp_millis())
        .bind(sale.header.payment_method.as_str())
        .bind(sale.header.total_amount.amount().to_string())
        .bind(&sale.header.customer.name)
        .bind(&sale.header.customer.phone)
        .bind(&sale.header.customer.email)
        .bind(&sale.header.notes)
        .bind(sale.header.last_modified_at.map(|t| t.timestamp_millis()))
        .bind(sale.subtotal.amount().to_string())
        .bind(sale.tax_rate.map(|r| r.value().to_string()))
        .bind(sale.tax.map(|t| t.amount().to_string()))
        .bind(discount_type)
        .bind(discount_value)
        .bind(sale.discount.map(|d| d.amount().to_string()))
        .bind(sale.total_profit.amount().to_string())
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &sale.header.id, &sale.items).await?;

        tx.commit().await?;

        info!(id = %sale.header.id, owner_id = %owner_id, "Multi-item sale recorded");
        Ok(sale)
    }

    /// Gets an active multi-item sale, items included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MultiItemSale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut conn, id).await
    }

    /// Edits a multi-item sale and recomputes every total.
    ///
    /// The item list is rewritten as a whole when the patch carries one.
    ///
    /// ## Errors
    /// - `NotFound` if the sale doesn't exist or was deleted
    /// - `Validation` if the edit would leave no items
    pub async fn update_multi_item_sale(
        &self,
        id: &str,
        patch: MultiItemSalePatch,
    ) -> DbResult<MultiItemSale> {
        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_active(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("MultiItemSale", id))?;

        let items_changed = patch.items.is_some();
        sale.apply_patch(patch, now_millis())?;

        debug!(id = %id, total = %sale.header.total_amount, items_changed, "Updating multi-item sale");

        let (discount_type, discount_value) = discount_columns(sale.discount_rule.as_ref());

        sqlx::query(
            r#"
            UPDATE multi_item_sales SET
                payment_method = ?2,
                total_amount = ?3,
                customer_name = ?4,
                customer_phone = ?5,
                customer_email = ?6,
                notes = ?7,
                last_modified_at = ?8,
                subtotal = ?9,
                tax_rate = ?10,
                tax = ?11,
                discount_type = ?12,
                discount_value = ?13,
                discount = ?14,
                total_profit = ?15
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(sale.header.payment_method.as_str())
        .bind(sale.header.total_amount.amount().to_string())
        .bind(&sale.header.customer.name)
        .bind(&sale.header.customer.phone)
        .bind(&sale.header.customer.email)
        .bind(&sale.header.notes)
        .bind(sale.header.last_modified_at.map(|t| t.timestamp_millis()))
        .bind(sale.subtotal.amount().to_string())
        .bind(sale.tax_rate.map(|r| r.value().to_string()))
        .bind(sale.tax.map(|t| t.amount().to_string()))
        .bind(discount_type)
        .bind(discount_value)
        .bind(sale.discount.map(|d| d.amount().to_string()))
        .bind(sale.total_profit.amount().to_string())
        .execute(&mut *tx)
        .await?;

        if items_changed {
            sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_items(&mut tx, id, &sale.items).await?;
        }

        tx.commit().await?;

        info!(id = %id, "Multi-item sale updated");
        Ok(sale)
    }

    /// Logically deletes a multi-item sale. Its items stay with it.
    pub async fn delete_multi_item_sale(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE multi_item_sales SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now_millis().timestamp_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MultiItemSale", id));
        }

        info!(id = %id, "Multi-item sale deleted");
        Ok(())
    }

    /// Active multi-item sales of an owner, newest first.
    pub async fn get_multi_item_sales(
        &self,
        owner_id: &str,
        limit: u32,
    ) -> DbResult<Vec<MultiItemSale>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<MultiItemSaleRow> = sqlx::query_as(&format!(
            "{} WHERE owner_id = ?1 AND deleted_at IS NULL ORDER BY timestamp DESC, id LIMIT ?2",
            SELECT_MULTI_ITEM_SALE
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = load_items(&mut conn, &row.id).await?;
            sales.push(row.into_sale(items)?);
        }
        Ok(sales)
    }
}

async fn fetch_active(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<MultiItemSale>> {
    let row: Option<MultiItemSaleRow> = sqlx::query_as(&format!(
        "{} WHERE id = ?1 AND deleted_at IS NULL",
        SELECT_MULTI_ITEM_SALE
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = load_items(conn, &row.id).await?;
            row.into_sale(items).map(Some)
        }
        None => Ok(None),
    }
}

async fn load_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let rows: Vec<SaleItemRow> = sqlx::query_as(
        r#"
        SELECT product_id, product_name, sale_type, quantity, unit_price, cost_price, profit
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(SaleItem::try_from).collect()
}

async fn insert_items(conn: &mut SqliteConnection, sale_id: &str, items: &[SaleItem]) -> DbResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, position, product_id, product_name, sale_type,
                quantity, unit_price, cost_price, profit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(sale_id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.sale_type.as_str())
        .bind(item.quantity.value().to_string())
        .bind(item.unit_price.amount().to_string())
        .bind(item.cost_price.amount().to_string())
        .bind(item.profit().amount().to_string())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
