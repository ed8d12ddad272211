//! # CLI Commands
//!
//! One module per subcommand. Each takes the resolved [`AppConfig`] and does
//! its work through duka-core and duka-db.
//!
//! ## Available Commands
//!
//! - [`import`] - Preview and commit a product CSV
//! - [`report`] - Sales rollups, top products, payment mix, low stock
//! - [`template`] - The import template

pub mod import;
pub mod report;
pub mod template;

use anyhow::Context;
use tracing::debug;

use duka_db::{Database, DbConfig};

use crate::config::AppConfig;

/// Opens the configured database, creating its directory if needed.
pub(crate) async fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }

    debug!(path = %config.db_path.display(), "Opening database");

    let db = Database::new(DbConfig::new(&config.db_path))
        .await
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    Ok(db)
}
