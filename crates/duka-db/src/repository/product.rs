//! # Product Repository
//!
//! Catalog products, scoped by owner.
//!
//! ## SKU Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UNIQUE (owner_id, sku)                                                 │
//! │                                                                         │
//! │  owner A: SUG-1KG ✓     owner B: SUG-1KG ✓     owner A: SUG-1KG ✗       │
//! │                                                  → DbError::UniqueViolation
//! │                                                                         │
//! │  Products created without a SKU get one from `generate_sku()`.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use duka_core::import::{generate_sku, ProductCatalog};
use duka_core::{NewProduct, Product};

use super::{instant, money, now_millis};
use crate::error::{DbError, DbResult};

/// Repository for catalog products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    owner_id: String,
    name: String,
    sku: String,
    category: String,
    description: Option<String>,
    cost_price: String,
    selling_price: String,
    quantity: i64,
    min_stock_level: i64,
    unit_of_measure: String,
    supplier: Option<String>,
    location: Option<String>,
    barcode: Option<String>,
    batch_number: Option<String>,
    tags: Option<String>,
    is_perishable: bool,
    expiry_date: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let expiry_date = row
            .expiry_date
            .as_deref()
            .map(|raw| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| DbError::corrupt("products.expiry_date", raw))
            })
            .transpose()?;

        Ok(Product {
            cost_price: money("products.cost_price", &row.cost_price)?,
            selling_price: money("products.selling_price", &row.selling_price)?,
            created_at: instant("products.created_at", row.created_at)?,
            updated_at: instant("products.updated_at", row.updated_at)?,
            expiry_date,
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            description: row.description,
            quantity: row.quantity,
            min_stock_level: row.min_stock_level,
            unit_of_measure: row.unit_of_measure,
            supplier: row.supplier,
            location: row.location,
            barcode: row.barcode,
            batch_number: row.batch_number,
            tags: row.tags,
            is_perishable: row.is_perishable,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, owner_id, name, sku, category, description,
        cost_price, selling_price, quantity, min_stock_level, unit_of_measure,
        supplier, location, barcode, batch_number, tags,
        is_perishable, expiry_date, created_at, updated_at
    FROM products
"#;

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a catalog product for `owner_id`.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the owner already has this SKU
    pub async fn create_product(&self, owner_id: &str, product: NewProduct) -> DbResult<Product> {
        let now = now_millis();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            sku: product.sku.unwrap_or_else(generate_sku),
            name: product.name,
            category: product.category,
            description: product.description,
            cost_price: product.cost_price,
            selling_price: product.selling_price,
            quantity: product.quantity,
            min_stock_level: product.min_stock_level,
            unit_of_measure: product.unit_of_measure,
            supplier: product.supplier,
            location: product.location,
            barcode: product.barcode,
            batch_number: product.batch_number,
            tags: product.tags,
            is_perishable: product.is_perishable,
            expiry_date: product.expiry_date,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, owner_id, name, sku, category, description,
                cost_price, selling_price, quantity, min_stock_level, unit_of_measure,
                supplier, location, barcode, batch_number, tags,
                is_perishable, expiry_date, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.cost_price.amount().to_string())
        .bind(product.selling_price.amount().to_string())
        .bind(product.quantity)
        .bind(product.min_stock_level)
        .bind(&product.unit_of_measure)
        .bind(&product.supplier)
        .bind(&product.location)
        .bind(&product.barcode)
        .bind(&product.batch_number)
        .bind(&product.tags)
        .bind(product.is_perishable)
        .bind(product.expiry_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(product.created_at.timestamp_millis())
        .bind(product.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(product)
    }

    /// All products of an owner, by name.
    pub async fn get_products(&self, owner_id: &str) -> DbResult<Vec<Product>> {
        debug!(owner_id = %owner_id, "Listing products");

        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{} WHERE owner_id = ?1 ORDER BY name, id", SELECT_PRODUCT))
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Number of products an owner has.
    pub async fn count(&self, owner_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE owner_id = ?1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// The import commit loop creates products through this.
#[async_trait]
impl ProductCatalog for ProductRepository {
    type Error = DbError;

    async fn create_product(&self, owner_id: &str, product: NewProduct) -> DbResult<String> {
        let created = ProductRepository::create_product(self, owner_id, product).await?;
        Ok(created.id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use duka_core::import::{commit, parse};
    use duka_core::Money;

    fn new_product(name: &str, sku: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            sku: sku.map(str::to_string),
            category: "Groceries".into(),
            description: None,
            cost_price: Money::from(120),
            selling_price: Money::from(150),
            quantity: 40,
            min_stock_level: 10,
            unit_of_measure: "pcs".into(),
            supplier: None,
            location: None,
            barcode: None,
            batch_number: None,
            tags: None,
            is_perishable: true,
            expiry_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 31),
        }
    }

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = repo().await;

        let created = repo
            .create_product("owner", new_product("Sugar 1kg", Some("SUG-1KG")))
            .await
            .unwrap();
        repo.create_product("owner", new_product("Bread", None))
            .await
            .unwrap();
        repo.create_product("other", new_product("Milk", None))
            .await
            .unwrap();

        let products = repo.get_products("owner").await.unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bread", "Sugar 1kg"]);
        assert!(products[0].sku.starts_with("SKU-"));

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.count("owner").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sku_per_owner() {
        let repo = repo().await;

        repo.create_product("owner", new_product("Sugar", Some("SUG")))
            .await
            .unwrap();
        repo.create_product("other", new_product("Sugar", Some("SUG")))
            .await
            .unwrap();

        let err = repo
            .create_product("owner", new_product("Sugar again", Some("SUG")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "SUG"));
    }

    #[tokio::test]
    async fn test_import_commit_through_repository() {
        let repo = repo().await;
        let parsed = parse(
            "name,category,costprice,sellingprice,quantity,sku\n\
             Sugar,Groceries,120,150,40,SUG\n\
             Salt,Groceries,20,30,10,SUG\n\
             Tea,Groceries,80,100,5,",
        )
        .unwrap();

        let outcome = commit(&repo, "owner", &parsed.rows, |_| {}).await;

        // Second row reuses the SKU and is refused; the rest go through.
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.failures[0].row, 3);
        assert_eq!(repo.count("owner").await.unwrap(), 2);
    }
}
