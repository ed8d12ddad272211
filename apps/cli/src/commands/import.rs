//! `duka import <FILE>`: preview a product CSV and create its rows.
//!
//! ```text
//!   read file ─► session.load ─► skipped rows / validation errors?
//!                                    │ yes: print them, exit 1
//!                                    ▼ no
//!                               --dry-run? ── yes: print row count, exit 0
//!                                    ▼ no
//!                               session.commit ─► progress line per row
//!                                    ▼
//!                         "N succeeded, M failed" (exit 1 if N == 0)
//! ```

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use duka_core::import::{
    CommitOutcome, CommitProgress, ImportError, ImportSession, ProductCatalog,
};

use super::open_database;
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Parse and validate only; create nothing
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(config: &AppConfig, args: ImportArgs) -> anyhow::Result<ExitCode> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let mut session = ImportSession::new();
    if !preview(&mut session, &text)? {
        return Ok(ExitCode::FAILURE);
    }

    if args.dry_run {
        println!("Dry run: nothing was created.");
        return Ok(ExitCode::SUCCESS);
    }

    let db = open_database(config).await?;
    let outcome = commit(&mut session, &db.products(), &config.owner_id).await?;
    db.close().await;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Loads `text` and prints what was found. `true` when it can be committed.
pub(crate) fn preview(session: &mut ImportSession, text: &str) -> Result<bool, ImportError> {
    session.load(text)?;

    if let Some(parsed) = session.parsed() {
        for skipped in &parsed.skipped {
            println!(
                "Skipped row {}: {} fields, expected {}",
                skipped.row, skipped.found, skipped.expected
            );
        }
        println!("{} rows ready for import", parsed.rows.len());
    }

    let errors = session.errors();
    if errors.is_empty() {
        return Ok(true);
    }

    println!("{} validation errors:", errors.len());
    for error in errors {
        println!("  row {} {}: {}", error.row, error.field, error.message);
    }
    Ok(false)
}

/// Creates the previewed rows, printing a line per row and a summary.
pub(crate) async fn commit<C>(
    session: &mut ImportSession,
    catalog: &C,
    owner_id: &str,
) -> Result<CommitOutcome, ImportError>
where
    C: ProductCatalog + ?Sized,
{
    let outcome = session
        .commit(catalog, owner_id, |progress| {
            println!("{}", progress_line(&progress))
        })
        .await?
        .clone();

    println!("{}", summary_line(&outcome));
    for failure in &outcome.failures {
        println!("  row {}: {}", failure.row, failure.message);
    }

    info!(
        owner_id = %owner_id,
        created = outcome.success_count,
        failed = outcome.error_count,
        "Import committed"
    );
    Ok(outcome)
}

fn progress_line(progress: &CommitProgress) -> String {
    let status = match &progress.last_error {
        Some(message) => format!("failed: {}", message),
        None => "ok".to_string(),
    };
    format!(
        "[{}/{}] {:>3.0}% {}",
        progress.completed,
        progress.total,
        progress.fraction() * 100.0,
        status
    )
}

fn summary_line(outcome: &CommitOutcome) -> String {
    format!(
        "{} succeeded, {} failed",
        outcome.success_count, outcome.error_count
    )
}
