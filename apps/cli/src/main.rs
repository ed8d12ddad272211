//! # duka
//!
//! Operator command line for Duka.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            duka (binary)                                │
//! │                                                                         │
//! │  Cli::parse() ─► AppConfig::load(--config) ─► flags ─► init_tracing     │
//! │                                                  │                      │
//! │            ┌─────────────────────┬───────────────┴──────┐               │
//! │            ▼                     ▼                      ▼               │
//! │     duka import <FILE>      duka report           duka template         │
//! │     (ImportSession +        (sale_records +       (template_csv)        │
//! │      ProductRepository)      dashboard)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! duka template --output products.csv
//! duka import products.csv --dry-run
//! duka --owner shop-42 import products.csv
//! duka report --top 10
//! ```

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::import::ImportArgs;
use crate::commands::report::ReportArgs;
use crate::commands::template::TemplateArgs;
use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "duka", version, about = "Sales and stock tools for a small shop")]
struct Cli {
    /// Config file (default: duka.toml in the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Owner whose data is used
    #[arg(long, global = true, value_name = "ID")]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import products from a CSV file
    Import(ImportArgs),

    /// Print sales rollups, top products, payment mix and low stock
    Report(ReportArgs),

    /// Print the product import template
    Template(TemplateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config)?;
    config.apply_flags(cli.db, cli.owner);
    config.validate()?;

    init_tracing(&config.log);
    info!(
        owner_id = %config.owner_id,
        db = %config.db_path.display(),
        "duka starting"
    );

    match cli.command {
        Command::Import(args) => commands::import::run(&config, args).await,
        Command::Report(args) => {
            commands::report::run(&config, args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Template(args) => {
            commands::template::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over the configured filter. Logs go to stderr so report
/// output stays clean on stdout.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["duka", "import", "products.csv", "--dry-run", "--owner", "shop-42"])
            .unwrap();

        assert_eq!(cli.owner.as_deref(), Some("shop-42"));
        match cli.command {
            Command::Import(args) => {
                assert!(args.dry_run);
                assert_eq!(args.file, PathBuf::from("products.csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
