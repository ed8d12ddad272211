//! # Sale Repository
//!
//! Single-item sales: one product or service line per row.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Single Sale Lifecycle                             │
//! │                                                                         │
//! │  create_sale(owner, draft)                                              │
//! │       │  SingleSale::from_draft → total + profit computed               │
//! │       ▼                                                                 │
//! │  ┌──────────┐  update_sale(id, patch)   ┌──────────┐                    │
//! │  │  ACTIVE  │ ────────────────────────► │  ACTIVE  │ last_modified_at   │
//! │  └────┬─────┘                           └────┬─────┘                    │
//! │       │ delete_sale(id)                      │                          │
//! │       ▼                                      ▼                          │
//! │  ┌──────────┐                                                           │
//! │  │ DELETED  │  deleted_at set; invisible to every read                  │
//! │  └──────────┘                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use duka_core::{CustomerInfo, SaleHeader, SingleSale, SingleSaleDraft, SingleSalePatch};

use super::{instant, money, now_millis, opt_instant, opt_money, parse_enum, quantity};
use crate::error::{DbError, DbResult};

/// Repository for single-item sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
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
    product_id: Option<String>,
    product_name: Option<String>,
    sale_type: String,
    quantity_sold: String,
    unit_price: String,
    cost_price: String,
    profit: Option<String>,
}

impl TryFrom<SaleRow> for SingleSale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> DbResult<Self> {
        Ok(SingleSale {
            header: SaleHeader {
                timestamp: instant("sales.timestamp", row.timestamp)?,
                payment_method: parse_enum("sales.payment_method", &row.payment_method)?,
                total_amount: money("sales.total_amount", &row.total_amount)?,
                last_modified_at: opt_instant("sales.last_modified_at", row.last_modified_at)?,
                customer: CustomerInfo {
                    name: row.customer_name,
                    phone: row.customer_phone,
                    email: row.customer_email,
                },
                id: row.id,
                owner_id: row.owner_id,
                notes: row.notes,
            },
            sale_type: parse_enum("sales.sale_type", &row.sale_type)?,
            quantity_sold: quantity("sales.quantity_sold", &row.quantity_sold)?,
            unit_price: money("sales.unit_price", &row.unit_price)?,
            cost_price: money("sales.cost_price", &row.cost_price)?,
            stored_profit: opt_money("sales.profit", row.profit.as_deref())?,
            product_id: row.product_id,
            product_name: row.product_name,
        })
    }
}

const SELECT_SALE: &str = r#"
    SELECT
        id, owner_id, timestamp, payment_method, total_amount,
        customer_name, customer_phone, customer_email, notes, last_modified_at,
        product_id, product_name, sale_type, quantity_sold, unit_price, cost_price, profit
    FROM sales
"#;

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a single-item sale.
    ///
    /// The draft is validated and the total and profit are computed before
    /// anything is written.
    ///
    /// ## Errors
    /// - `Validation` if the draft is rejected by duka-core
    pub async fn create_sale(&self, owner_id: &str, draft: SingleSaleDraft) -> DbResult<SingleSale> {
        let sale = SingleSale::from_draft(Uuid::new_v4().to_string(), owner_id, now_millis(), draft)?;

        debug!(id = %sale.header.id, total = %sale.header.total_amount, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, owner_id, timestamp, payment_method, total_amount,
                customer_name, customer_phone, customer_email, notes, last_modified_at,
                product_id, product_name, sale_type, quantity_sold, unit_price, cost_price, profit
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
        .bind(&sale.product_id)
        .bind(&sale.product_name)
        .bind(sale.sale_type.as_str())
        .bind(sale.quantity_sold.value().to_string())
        .bind(sale.unit_price.amount().to_string())
        .bind(sale.cost_price.amount().to_string())
        .bind(sale.stored_profit.map(|p| p.amount().to_string()))
        .execute(&self.pool)
        .await?;

        info!(id = %sale.header.id, owner_id = %owner_id, "Sale recorded");
        Ok(sale)
    }

    /// Gets an active sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SingleSale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut conn, id).await
    }

    /// Edits a sale, recomputing its total and profit.
    ///
    /// ## Errors
    /// - `NotFound` if the sale doesn't exist or was deleted
    /// - `Validation` if the edited sale is rejected
    pub async fn update_sale(&self, id: &str, patch: SingleSalePatch) -> DbResult<SingleSale> {
        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_active(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        sale.apply_patch(patch, now_millis())?;

        debug!(id = %id, total = %sale.header.total_amount, "Updating sale");

        sqlx::query(
            r#"
            UPDATE sales SET
                payment_method = ?2,
                total_amount = ?3,
                customer_name = ?4,
                customer_phone = ?5,
                customer_email = ?6,
                notes = ?7,
                last_modified_at = ?8,
                product_name = ?9,
                quantity_sold = ?10,
                unit_price = ?11,
                cost_price = ?12,
                profit = ?13
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
        .bind(&sale.product_name)
        .bind(sale.quantity_sold.value().to_string())
        .bind(sale.unit_price.amount().to_string())
        .bind(sale.cost_price.amount().to_string())
        .bind(sale.stored_profit.map(|p| p.amount().to_string()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %id, "Sale updated");
        Ok(sale)
    }

    /// Logically deletes a sale.
    ///
    /// ## Errors
    /// - `NotFound` if the sale doesn't exist or was already deleted
    pub async fn delete_sale(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sales SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now_millis().timestamp_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        info!(id = %id, "Sale deleted");
        Ok(())
    }

    /// Active sales of an owner, newest first.
    pub async fn get_sales(&self, owner_id: &str, limit: u32) -> DbResult<Vec<SingleSale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "{} WHERE owner_id = ?1 AND deleted_at IS NULL ORDER BY timestamp DESC, id LIMIT ?2",
            SELECT_SALE
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SingleSale::try_from).collect()
    }
}

async fn fetch_active(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SingleSale>> {
    let row: Option<SaleRow> = sqlx::query_as(&format!(
        "{} WHERE id = ?1 AND deleted_at IS NULL",
        SELECT_SALE
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(SingleSale::try_from).transpose()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use duka_core::{CoreError, Money, PaymentMethod, Quantity, SaleType};

    fn draft(quantity: i64, unit_price: i64, cost_price: i64) -> SingleSaleDraft {
        SingleSaleDraft {
            product_id: Some("prod-1".into()),
            product_name: "Sugar 1kg".into(),
            sale_type: SaleType::Product,
            quantity: Quantity::from(quantity),
            unit_price: Money::from(unit_price),
            cost_price: Money::from(cost_price),
            payment_method: PaymentMethod::Cash,
            customer: CustomerInfo::default(),
            notes: None,
        }
    }

    async fn repo() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;

        let sale = repo.create_sale("owner", draft(3, 150, 120)).await.unwrap();
        assert_eq!(sale.header.total_amount, Money::from(450));
        assert_eq!(sale.profit(), Money::from(90));

        let fetched = repo.get_by_id(&sale.header.id).await.unwrap().unwrap();
        assert_eq!(fetched, sale);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_written() {
        let repo = repo().await;

        let err = repo.create_sale("owner", draft(0, 150, 120)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(CoreError::Validation(_))));
        assert!(repo.get_sales("owner", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_recomputes() {
        let repo = repo().await;
        let sale = repo.create_sale("owner", draft(3, 150, 120)).await.unwrap();

        let updated = repo
            .update_sale(
                &sale.header.id,
                SingleSalePatch {
                    quantity: Some(Quantity::from(5)),
                    payment_method: Some(PaymentMethod::Mpesa),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.header.total_amount, Money::from(750));
        assert_eq!(updated.profit(), Money::from(150));
        assert!(updated.header.last_modified_at.is_some());

        let fetched = repo.get_by_id(&sale.header.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let repo = repo().await;
        let err = repo
            .update_sale("missing", SingleSalePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_hides_sale() {
        let repo = repo().await;
        let sale = repo.create_sale("owner", draft(1, 100, 80)).await.unwrap();

        repo.delete_sale(&sale.header.id).await.unwrap();

        assert!(repo.get_by_id(&sale.header.id).await.unwrap().is_none());
        assert!(repo.get_sales("owner", 10).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_sale(&sale.header.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update_sale(&sale.header.id, SingleSalePatch::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_sales_newest_first_with_limit() {
        let repo = repo().await;

        let first = repo.create_sale("owner", draft(1, 100, 80)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.create_sale("owner", draft(2, 100, 80)).await.unwrap();

        let sales = repo.get_sales("owner", 10).await.unwrap();
        let ids: Vec<&str> = sales.iter().map(|s| s.header.id.as_str()).collect();
        assert_eq!(ids, vec![second.header.id.as_str(), first.header.id.as_str()]);

        assert_eq!(repo.get_sales("owner", 1).await.unwrap().len(), 1);
    }
}
