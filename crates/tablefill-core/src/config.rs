//! # Configuration File Parser
//!
//! Reads and parses `tablefill.toml`, the optional configuration file that
//! sets defaults without requiring CLI flags. Supports:
//!
//! - `[database]`: default connection URL and extra schemas to skip
//! - `[fill]`: default rows per table and a fixed seed
//! - `[tables."<schema>.<table>"]`: per-table row count overrides
//!
//! Example `tablefill.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/myapp"
//! exclude_schemas = ["audit"]
//!
//! [fill]
//! rows = 25
//! seed = 42
//!
//! [tables."public.orders"]
//! rows = 100
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TableFillError};
use crate::fill::{FillOptions, DEFAULT_ROWS_PER_TABLE};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "tablefill.toml";

/// Top-level tablefill.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableFillConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Default fill settings.
    pub fill: FillConfig,
    /// Per-table overrides, keyed by qualified table name.
    pub tables: BTreeMap<String, TableConfig>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "postgres://localhost/myapp").
    pub url: Option<String>,
    /// Schemas to skip in addition to the system schemas.
    pub exclude_schemas: Vec<String>,
}

/// Default fill settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Rows per table.
    pub rows: Option<usize>,
    /// Fixed random seed for deterministic generation.
    pub seed: Option<u64>,
}

/// Per-table configuration override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of rows to insert into this table.
    pub rows: Option<usize>,
}

/// Read and parse a tablefill.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or validated.
pub fn read_config(dir: &Path) -> Result<Option<TableFillConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| TableFillError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let config = parse_config(&content).map_err(|e| match e {
        TableFillError::Config { message } => TableFillError::Config {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })?;

    Ok(Some(config))
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<TableFillConfig> {
    let config: TableFillConfig = toml::from_str(content).map_err(|e| TableFillError::Config {
        message: format!("Failed to parse: {}", e),
    })?;
    config.validate()?;
    Ok(config)
}

impl TableFillConfig {
    /// Build per-table row counts from the [tables] section.
    pub fn table_row_overrides(&self) -> BTreeMap<String, usize> {
        self.tables
            .iter()
            .filter_map(|(name, tc)| tc.rows.map(|rows| (name.clone(), rows)))
            .collect()
    }

    /// Fill options with config values applied over the defaults.
    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            default_rows: self.fill.rows.unwrap_or(DEFAULT_ROWS_PER_TABLE),
            table_rows: self.table_row_overrides(),
            seed: self.fill.seed,
        }
    }

    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.fill.rows == Some(0) {
            return Err(TableFillError::Config {
                message: "[fill] rows must be at least 1".to_string(),
            });
        }

        for (name, tc) in &self.tables {
            if !name.contains('.') {
                return Err(TableFillError::Config {
                    message: format!(
                        "[tables.\"{}\"] must be a qualified name like \"public.{}\"",
                        name, name
                    ),
                });
            }
            if tc.rows == Some(0) {
                return Err(TableFillError::Config {
                    message: format!("[tables.\"{}\"] rows must be at least 1", name),
                });
            }
        }
        Ok(())
    }
}
