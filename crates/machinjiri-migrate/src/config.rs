//! Migration tool configuration.
//!
//! Loaded from an optional JSON file (`machinjiri.json` by default). Every
//! field has a default, so a partial file or no file at all is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::ledger::DEFAULT_TABLE;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "machinjiri.json";

/// Settings for the `machinjiri-migrate` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Connection URL.
    pub database_url: String,
    /// Ledger table name.
    pub migrations_table: String,
    /// Where `make` writes new migration files.
    pub migrations_dir: PathBuf,
    /// Prefix applied to every table name.
    pub table_prefix: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            database_url: String::from("sqlite:db.sqlite3"),
            migrations_table: String::from(DEFAULT_TABLE),
            migrations_dir: PathBuf::from("migrations"),
            table_prefix: String::new(),
            max_connections: 5,
        }
    }
}

impl MigrateConfig {
    /// Reads `path`, or returns the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Checks values that have no usable fallback.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(MigrateError::Config(String::from(
                "database_url must not be empty",
            )));
        }
        if self.migrations_table.trim().is_empty() {
            return Err(MigrateError::Config(String::from(
                "migrations_table must not be empty",
            )));
        }
        Ok(())
    }
}
