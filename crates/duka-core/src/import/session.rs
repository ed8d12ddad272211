//! # Import Session
//!
//! The state machine behind the upload screen.
//!
//! ```text
//!            load (ok)             commit (0 errors)         all rows tried
//!  ┌────────┐ ───────► ┌─────────┐ ───────────────► ┌────────────┐ ──► ┌──────────┐
//!  │ Upload │          │ Preview │                  │ Processing │     │ Complete │
//!  └────────┘ ◄─────── └─────────┘                  └────────────┘     └──────────┘
//!      ▲  ▲    cancel                                                       │
//!      │  └── load (parse error): stays in Upload                           │
//!      └──────────────────────────────── reset ─────────────────────────────┘
//! ```
//!
//! Once processing starts it runs to completion; there is no cancel.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use super::commit::{commit, CommitOutcome, CommitProgress, ProductCatalog};
use super::error::{ImportError, ImportResult};
use super::parser::{parse, ParsedImport};
use super::validator::{validate, ImportRowError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    #[default]
    Upload,
    Preview,
    Processing,
    Complete,
}

#[derive(Debug, Default)]
pub struct ImportSession {
    stage: ImportStage,
    parsed: Option<ParsedImport>,
    errors: Vec<ImportRowError>,
    outcome: Option<CommitOutcome>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    /// The parsed file, while in Preview or later.
    pub fn parsed(&self) -> Option<&ParsedImport> {
        self.parsed.as_ref()
    }

    /// Validation errors of the loaded file.
    pub fn errors(&self) -> &[ImportRowError] {
        &self.errors
    }

    pub fn outcome(&self) -> Option<&CommitOutcome> {
        self.outcome.as_ref()
    }

    /// Parses and validates a file. Upload → Preview.
    ///
    /// A parse failure, or a file whose rows were all skipped, leaves the
    /// session in Upload.
    pub fn load(&mut self, text: &str) -> ImportResult<&[ImportRowError]> {
        self.require_stage(ImportStage::Upload, "load a file")?;

        let parsed = parse(text)?;
        if parsed.is_empty() {
            return Err(ImportError::NoRows {
                skipped: parsed.skipped.len(),
            });
        }

        self.errors = validate(&parsed.rows);
        info!(
            rows = parsed.rows.len(),
            errors = self.errors.len(),
            "Import file loaded"
        );
        self.parsed = Some(parsed);
        self.stage = ImportStage::Preview;

        Ok(&self.errors)
    }

    /// Abandons a previewed file. Preview → Upload, nothing retained.
    pub fn cancel(&mut self) -> ImportResult<()> {
        self.require_stage(ImportStage::Preview, "cancel")?;
        *self = Self::default();
        Ok(())
    }

    /// Creates every previewed row. Preview → Processing → Complete.
    ///
    /// Refused while validation errors are outstanding.
    pub async fn commit<C, F>(
        &mut self,
        catalog: &C,
        owner_id: &str,
        on_progress: F,
    ) -> ImportResult<&CommitOutcome>
    where
        C: ProductCatalog + ?Sized,
        F: FnMut(CommitProgress),
    {
        self.require_stage(ImportStage::Preview, "commit")?;
        if !self.errors.is_empty() {
            return Err(ImportError::ValidationFailed {
                count: self.errors.len(),
            });
        }

        self.stage = ImportStage::Processing;
        let rows = self
            .parsed
            .as_ref()
            .map(|p| p.rows.as_slice())
            .unwrap_or_default();
        let outcome = commit(catalog, owner_id, rows, on_progress).await;

        self.stage = ImportStage::Complete;
        Ok(self.outcome.insert(outcome))
    }

    /// Starts over after a finished import. Complete → Upload.
    pub fn reset(&mut self) -> ImportResult<()> {
        self.require_stage(ImportStage::Complete, "reset")?;
        *self = Self::default();
        Ok(())
    }

    fn require_stage(&self, stage: ImportStage, action: &'static str) -> ImportResult<()> {
        if self.stage != stage {
            return Err(ImportError::InvalidTransition {
                from: self.stage,
                action,
            });
        }
        Ok(())
    }
}
