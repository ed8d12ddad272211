//! # CLI Configuration
//!
//! Settings for the `duka` binary.
//!
//! ## Configuration Sources (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (this file)                                                │
//! │  2. Config file                                                         │
//! │     --config <FILE>, otherwise the platform config dir:                 │
//! │     ~/.config/duka/duka.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.duka.duka/duka.toml (macOS)       │
//! │  3. Environment variables (DUKA_*)                                      │
//! │  4. Command line flags (--db, --owner)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! # duka.toml
//! db_path = "/var/lib/duka/duka.db"
//! owner_id = "shop-42"
//! currency = "KES"
//! utc_offset_minutes = 180
//! top_products = 5
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use duka_core::locale::Currency;

const CONFIG_FILE: &str = "duka.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Resolved configuration for one `duka` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Owner whose sales and products are read and written.
    pub owner_id: String,

    /// ISO 4217 code used when printing amounts.
    pub currency: String,

    /// Shop-local offset from UTC, for today / week / month windows.
    pub utc_offset_minutes: i32,

    /// How many products the report ranks.
    pub top_products: usize,

    /// Upper bound on sales loaded for a report.
    pub history_limit: u32,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: default_db_path(),
            owner_id: "default".to_string(),
            currency: "KES".to_string(),
            // East Africa Time
            utc_offset_minutes: 180,
            top_products: 5,
            history_limit: 10_000,
            log: "info,duka=debug,sqlx=warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from file and environment over the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = config_path.or_else(default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Applies `DUKA_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DUKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.db_path = PathBuf::from(path);
        }

        if let Some(owner) = lookup("DUKA_OWNER_ID") {
            self.owner_id = owner;
        }

        if let Some(code) = lookup("DUKA_CURRENCY") {
            self.currency = code;
        }

        if let Some(offset) = lookup("DUKA_UTC_OFFSET_MINUTES") {
            if let Ok(minutes) = offset.trim().parse() {
                self.utc_offset_minutes = minutes;
            }
        }

        if let Some(top) = lookup("DUKA_TOP_PRODUCTS") {
            if let Ok(n) = top.trim().parse() {
                self.top_products = n;
            }
        }

        if let Some(filter) = lookup("DUKA_LOG") {
            self.log = filter;
        }
    }

    /// Applies `--db` / `--owner`.
    pub fn apply_flags(&mut self, db: Option<PathBuf>, owner: Option<String>) {
        if let Some(db) = db {
            self.db_path = db;
        }
        if let Some(owner) = owner {
            self.owner_id = owner;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_id.trim().is_empty() {
            return Err(ConfigError::Invalid("owner_id must not be empty".into()));
        }
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is outside ±840",
                self.utc_offset_minutes
            )));
        }
        if self.top_products == 0 {
            return Err(ConfigError::Invalid("top_products must be at least 1".into()));
        }
        Ok(())
    }

    pub fn currency(&self) -> Currency {
        Currency::from_code(&self.currency)
    }

    /// The shop's offset. `validate` keeps this in range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "duka", "duka")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Platform data directory, or the working directory as a fallback.
fn default_db_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("duka.db"))
        .unwrap_or_else(|| PathBuf::from("duka.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            owner_id = "shop-42"
            currency = "UGX"
            "#,
        )
        .unwrap();

        assert_eq!(config.owner_id, "shop-42");
        assert_eq!(config.currency().decimals, 0);
        assert_eq!(config.top_products, 5);
        assert_eq!(config.utc_offset_minutes, 180);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DUKA_OWNER_ID", "shop-7"),
            ("DUKA_UTC_OFFSET_MINUTES", "-300"),
            ("DUKA_TOP_PRODUCTS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.owner_id, "shop-7");
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.top_products, 5);
        assert_eq!(config.offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_flags_win() {
        let mut config = AppConfig::default();
        config.apply_flags(Some(PathBuf::from("/tmp/x.db")), None);

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.owner_id, "default");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.utc_offset_minutes = 15 * 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.owner_id = "  ".into();
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(PathBuf::from("/nonexistent/duka.toml"))).unwrap();
        assert_eq!(config.top_products, 5);
    }
}
