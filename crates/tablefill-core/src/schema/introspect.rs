use std::future::Future;

use tracing::info;

use crate::error::{Result, TableFillError};
use crate::generate::row::RowPayload;
use crate::generate::value::Value;
use crate::graph::dag::SchemaGraph;
use crate::schema::types::{ColumnRow, ForeignKeyRow};

/// Source of raw schema metadata.
/// Each database backend implements this to enumerate columns and foreign keys,
/// excluding system schemas.
pub trait SchemaMetadataProvider: Send + Sync {
    /// Every `(schema, table, column, declared type)` tuple.
    fn columns(&self) -> impl Future<Output = Result<Vec<ColumnRow>>> + Send;

    /// Every single-column foreign-key tuple.
    fn foreign_keys(&self) -> impl Future<Output = Result<Vec<ForeignKeyRow>>> + Send;
}

/// Source of enum type information.
pub trait EnumCatalogProvider: Send + Sync {
    /// Whether `type_name` names an enum type.
    fn is_enum(&self, type_name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// The ordered labels of the enum `type_name`.
    fn enum_labels(&self, type_name: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Destination for synthesized rows.
///
/// Rows inserted for a table must be visible to `sample_value` on that table
/// before the call returns.
pub trait RowSink: Send + Sync {
    /// Insert one row. Constraint violations surface as errors.
    fn insert_row(
        &self,
        row_index: usize,
        row: &RowPayload,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Pick one existing value of `table.column` uniformly at random.
    /// Returns `None` when the table has no rows.
    fn sample_value(
        &self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = Result<Option<Value>>> + Send;
}

/// Fetch column and foreign-key metadata and build the schema graph.
pub async fn introspect_graph<P: SchemaMetadataProvider>(provider: &P) -> Result<SchemaGraph> {
    let columns = provider.columns().await?;
    let foreign_keys = provider.foreign_keys().await?;

    info!(
        "Introspected {} columns and {} foreign keys",
        columns.len(),
        foreign_keys.len()
    );

    Ok(SchemaGraph::build(&columns, &foreign_keys))
}

/// Reject connection URLs for databases other than PostgreSQL.
pub fn ensure_postgres_url(url: &str) -> Result<()> {
    let scheme = url.split("://").next().unwrap_or("");
    match scheme {
        "postgres" | "postgresql" => Ok(()),
        other => Err(TableFillError::UnsupportedDatabase {
            scheme: other.to_string(),
        }),
    }
}
