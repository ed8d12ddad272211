//! # duka-db: Database Layer for Duka
//!
//! SQLite storage for sales and the product catalog, using sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Duka Data Flow                                 │
//! │                                                                         │
//! │  duka-cli (import / report)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo     │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo        │   │ 001_initial  │  │   │
//! │  │   │               │    │ MultiItemSaleRepo│  │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (duka.db)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories persist what duka-core computes. They never do sale
//! arithmetic themselves: drafts and patches go through `from_draft` /
//! `apply_patch` first.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("duka.db")).await?;
//! let records = db.sale_records("owner-1", 500).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::multi_item_sale::MultiItemSaleRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
