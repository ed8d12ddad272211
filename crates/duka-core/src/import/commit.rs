//! # Import Commit
//!
//! Creates validated candidates in the catalog, one row at a time.
//!
//! ## Failure Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  row 2 ──► create ──► ok      success_count += 1                        │
//! │  row 3 ──► create ──► ok      success_count += 1                        │
//! │  row 4 ──► create ──► Err ──► error_count += 1, warn!, keep going       │
//! │  row 5 ──► create ──► ok      success_count += 1                        │
//! │                                                                         │
//! │  No retry. No rollback. Strict file order. Progress after every row.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows run sequentially so progress is meaningful and each failure is
//! attributable to exactly one row.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::ImportRow;
use crate::types::NewProduct;

// =============================================================================
// Catalog Seam
// =============================================================================

/// Whatever creates products: the SQLite repository in production, a fake
/// in tests.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a product for `owner_id` and returns its id.
    async fn create_product(&self, owner_id: &str, product: NewProduct) -> Result<String, Self::Error>;
}

// =============================================================================
// Progress & Outcome
// =============================================================================

/// Reported after each attempted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommitProgress {
    pub completed: usize,
    pub total: usize,
    /// Failure message of the row just attempted, if it failed.
    pub last_error: Option<String>,
}

impl CommitProgress {
    /// `completed / total`, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// A row the catalog refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub success_count: usize,
    pub error_count: usize,
    pub failures: Vec<RowFailure>,
    /// Ids of the created products, in file order.
    pub created_ids: Vec<String>,
}

impl CommitOutcome {
    /// False only when nothing at all was created.
    pub fn is_success(&self) -> bool {
        self.success_count > 0
    }

    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && self.error_count > 0
    }
}

// =============================================================================
// Commit
// =============================================================================

/// Short unique SKU for rows that don't bring their own.
pub fn generate_sku() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("SKU-{}", token[..8].to_uppercase())
}

/// Creates every row through `catalog`, continuing past failures.
pub async fn commit<C, F>(
    catalog: &C,
    owner_id: &str,
    rows: &[ImportRow],
    mut on_progress: F,
) -> CommitOutcome
where
    C: ProductCatalog + ?Sized,
    F: FnMut(CommitProgress),
{
    let total = rows.len();
    let mut outcome = CommitOutcome::default();

    info!(owner_id = %owner_id, total, "Committing product import");

    for (idx, row) in rows.iter().enumerate() {
        let sku = row.candidate.sku.clone().unwrap_or_else(generate_sku);
        let product = row.candidate.to_new_product(sku);

        let last_error = match catalog.create_product(owner_id, product).await {
            Ok(id) => {
                outcome.success_count += 1;
                outcome.created_ids.push(id);
                None
            }
            Err(e) => {
                warn!(row = row.row, error = %e, "Failed to import product row");
                let message = e.to_string();
                outcome.error_count += 1;
                outcome.failures.push(RowFailure {
                    row: row.row,
                    message: message.clone(),
                });
                Some(message)
            }
        };

        on_progress(CommitProgress {
            completed: idx + 1,
            total,
            last_error,
        });
    }

    info!(
        success = outcome.success_count,
        failed = outcome.error_count,
        "Product import finished"
    );

    outcome
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::import::parse;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("catalog rejected {0}")]
    pub(crate) struct Rejected(pub String);

    /// Records every call; fails for names listed in `reject`.
    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub reject: Vec<String>,
        pub created: Mutex<Vec<NewProduct>>,
    }

    #[async_trait]
    impl ProductCatalog for FakeCatalog {
        type Error = Rejected;

        async fn create_product(
            &self,
            _owner_id: &str,
            product: NewProduct,
        ) -> Result<String, Self::Error> {
            if self.reject.contains(&product.name) {
                return Err(Rejected(product.name));
            }
            let mut created = self.created.lock().unwrap();
            created.push(product);
            Ok(format!("prod-{}", created.len()))
        }
    }

    pub(crate) fn five_rows() -> Vec<ImportRow> {
        parse(
            "name,category,costprice,sellingprice,quantity,sku\n\
             P1,Cat,1,2,3,S1\n\
             P2,Cat,1,2,3,S2\n\
             P3,Cat,1,2,3,S3\n\
             P4,Cat,1,2,3,S4\n\
             P5,Cat,1,2,3,",
        )
        .unwrap()
        .rows
    }

    #[tokio::test]
    async fn test_third_row_failure_does_not_stop_batch() {
        let catalog = FakeCatalog {
            reject: vec!["P3".into()],
            ..Default::default()
        };
        let mut progress = Vec::new();

        let outcome = commit(&catalog, "owner", &five_rows(), |p| progress.push(p)).await;

        assert_eq!(outcome.success_count, 4);
        assert_eq!(outcome.error_count, 1);
        assert!(outcome.is_success());
        assert!(outcome.is_partial());
        assert_eq!(outcome.failures[0].row, 4);

        let created = catalog.created.lock().unwrap();
        let names: Vec<&str> = created.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2", "P4", "P5"]);

        let completed: Vec<usize> = progress.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![1, 2, 3, 4, 5]);
        assert!(progress[2].last_error.is_some());
        assert!(progress[3].last_error.is_none());
        assert_eq!(progress[4].fraction(), 1.0);
    }

    #[tokio::test]
    async fn test_missing_sku_is_generated_at_commit() {
        let catalog = FakeCatalog::default();
        let rows = five_rows();
        assert_eq!(rows[4].candidate.sku, None);

        commit(&catalog, "owner", &rows, |_| {}).await;

        let created = catalog.created.lock().unwrap();
        assert_eq!(created[0].sku.as_deref(), Some("S1"));
        let generated = created[4].sku.as_deref().unwrap();
        assert!(generated.starts_with("SKU-"));
        assert_eq!(generated.len(), 12);
    }

    #[tokio::test]
    async fn test_all_rows_failing_is_not_success() {
        let catalog = FakeCatalog {
            reject: (1..=5).map(|i| format!("P{}", i)).collect(),
            ..Default::default()
        };

        let outcome = commit(&catalog, "owner", &five_rows(), |_| {}).await;

        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.error_count, 5);
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_generated_skus_differ() {
        assert_ne!(generate_sku(), generate_sku());
    }
}
