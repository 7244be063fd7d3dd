pub mod fill;
pub mod graph;
pub mod introspect;
pub mod plan;
pub mod preview;

use std::path::Path;

use anyhow::{Context, Result};

use tablefill_core::config::{read_config, TableFillConfig};
use tablefill_core::error::TableFillError;
use tablefill_core::schema::introspect::ensure_postgres_url;
use tablefill_core::schema::postgres::PostgresCatalog;

/// Load the optional tablefill.toml from the working directory.
pub fn load_config() -> Result<Option<TableFillConfig>> {
    read_config(Path::new(".")).context("Failed to load tablefill.toml")
}

/// Resolve the database URL from `--db` (which clap already falls back to
/// DATABASE_URL for, .env included) and then tablefill.toml.
pub fn resolve_db_url(explicit: Option<&str>, config: Option<&TableFillConfig>) -> Result<String> {
    let url = explicit
        .map(str::to_string)
        .or_else(|| config.and_then(|cfg| cfg.database.url.clone()))
        .ok_or(TableFillError::NoDatabaseUrl)?;
    ensure_postgres_url(&url)?;
    Ok(url)
}

/// Resolve the URL and connect, honoring the configured schema exclusions.
pub async fn connect(
    explicit: Option<&str>,
    config: Option<&TableFillConfig>,
    extra_excluded: &[String],
) -> Result<PostgresCatalog> {
    let db_url = resolve_db_url(explicit, config)?;

    let mut excluded: Vec<String> = config
        .map(|cfg| cfg.database.exclude_schemas.clone())
        .unwrap_or_default();
    excluded.extend(extra_excluded.iter().cloned());

    Ok(PostgresCatalog::connect(&db_url, &excluded).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablefill_core::config::parse_config;

    #[test]
    fn test_explicit_url_wins() {
        let config = parse_config("[database]\nurl = \"postgres://config/db\"\n").unwrap();
        let url = resolve_db_url(Some("postgres://flag/db"), Some(&config)).unwrap();
        assert_eq!(url, "postgres://flag/db");
    }

    #[test]
    fn test_config_url_fallback() {
        let config = parse_config("[database]\nurl = \"postgres://config/db\"\n").unwrap();
        assert_eq!(
            resolve_db_url(None, Some(&config)).unwrap(),
            "postgres://config/db"
        );
    }

    #[test]
    fn test_missing_url() {
        let err = resolve_db_url(None, None).unwrap_err();
        assert!(err.to_string().contains("No database URL"));
    }

    #[test]
    fn test_rejects_other_databases() {
        let err = resolve_db_url(Some("mysql://localhost/app"), None).unwrap_err();
        assert!(err.to_string().contains("mysql"));
    }
}
