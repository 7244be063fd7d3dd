//! # PostgreSQL Catalog
//!
//! `PostgresCatalog` implements all three capabilities the fill pipeline
//! consumes, over one `sqlx` pool:
//!
//! - **Schema metadata** from `information_schema`, base tables only, with the
//!   system schemas (and any extra configured schemas) excluded.
//! - **Enum catalog** from `pg_type` / `pg_enum`.
//! - **Row sink**: parameterized single-row `INSERT`s and
//!   `ORDER BY random() LIMIT 1` sampling.
//!
//! Every value is bound as text and cast on the server to the column's type,
//! schema-qualified and quoted by the catalog itself (`$1::pg_catalog.int8`,
//! `$2::public.order_status`), so the sink never formats literals. Sampled
//! values come back as text for the same reason.
//!
//! The pool holds a single connection: each insert commits before the next
//! statement runs, which gives the insert-then-read consistency parent
//! sampling relies on.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::debug;

use crate::error::{Result, TableFillError};
use crate::generate::row::RowPayload;
use crate::generate::value::Value;
use crate::schema::introspect::{EnumCatalogProvider, RowSink, SchemaMetadataProvider};
use crate::schema::types::{split_qualified, ColumnRow, ForeignKeyRow, SYSTEM_SCHEMAS};

/// One row per foreign-key column. Both ends are resolved by oid, so the
/// referenced table keeps its own schema.
const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT
        child_ns.nspname::text AS table_schema,
        child.relname::text AS table_name,
        child_col.attname::text AS column_name,
        con.conname::text AS constraint_name,
        parent_ns.nspname::text AS referenced_schema,
        parent.relname::text AS referenced_table,
        parent_col.attname::text AS referenced_column
    FROM pg_constraint con
    JOIN pg_class child ON child.oid = con.conrelid
    JOIN pg_namespace child_ns ON child_ns.oid = child.relnamespace
    JOIN pg_class parent ON parent.oid = con.confrelid
    JOIN pg_namespace parent_ns ON parent_ns.oid = parent.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
        WITH ORDINALITY AS k(child_attnum, parent_attnum, position)
    JOIN pg_attribute child_col
        ON child_col.attrelid = con.conrelid
        AND child_col.attnum = k.child_attnum
    JOIN pg_attribute parent_col
        ON parent_col.attrelid = con.confrelid
        AND parent_col.attnum = k.parent_attnum
    WHERE con.contype = 'f'
        AND child_ns.nspname::text <> ALL($1)
    ORDER BY child_ns.nspname, child.relname, con.conname, k.position
"#;

pub struct PostgresCatalog {
    pool: PgPool,
    excluded_schemas: Vec<String>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self::with_excluded_schemas(pool, &[])
    }

    /// Exclude `extra` schemas on top of the system schemas.
    pub fn with_excluded_schemas(pool: PgPool, extra: &[String]) -> Self {
        let mut excluded_schemas: Vec<String> =
            SYSTEM_SCHEMAS.iter().map(|s| s.to_string()).collect();
        for schema in extra {
            if !excluded_schemas.contains(schema) {
                excluded_schemas.push(schema.clone());
            }
        }
        Self {
            pool,
            excluded_schemas,
        }
    }

    /// Open a single-connection pool to `db_url`.
    pub async fn connect(db_url: &str, extra_excluded: &[String]) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await
            .map_err(|e| TableFillError::Connection {
                message: "Failed to connect to PostgreSQL".to_string(),
                connection_hint: sanitize_url(db_url),
                source: e,
            })?;
        Ok(Self::with_excluded_schemas(pool, extra_excluded))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SchemaMetadataProvider for PostgresCatalog {
    async fn columns(&self) -> Result<Vec<ColumnRow>> {
        let query = r#"
            SELECT
                c.table_schema::text AS table_schema,
                c.table_name::text AS table_name,
                c.column_name::text AS column_name,
                CASE WHEN c.data_type = 'USER-DEFINED'
                    THEN c.udt_name::text
                    ELSE c.data_type::text
                END AS declared_type,
                quote_ident(c.udt_schema::text) || '.' || quote_ident(c.udt_name::text) AS cast_type
            FROM information_schema.columns c
            JOIN information_schema.tables t
                ON t.table_schema = c.table_schema
                AND t.table_name = c.table_name
            WHERE t.table_type = 'BASE TABLE'
                AND c.table_schema::text <> ALL($1)
            ORDER BY c.table_schema, c.table_name, c.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(self.excluded_schemas.as_slice())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TableFillError::Introspection {
                query: "fetch columns".to_string(),
                source: e,
            })?;

        Ok(rows
            .iter()
            .map(|row| ColumnRow {
                schema: row.get("table_schema"),
                table: row.get("table_name"),
                column: row.get("column_name"),
                declared_type: row.get("declared_type"),
                cast_type: row.get("cast_type"),
            })
            .collect())
    }

    async fn foreign_keys(&self) -> Result<Vec<ForeignKeyRow>> {
        let rows = sqlx::query(FOREIGN_KEYS_QUERY)
            .bind(self.excluded_schemas.as_slice())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TableFillError::Introspection {
                query: "fetch foreign keys".to_string(),
                source: e,
            })?;

        Ok(rows
            .iter()
            .map(|row| ForeignKeyRow {
                schema: row.get("table_schema"),
                table: row.get("table_name"),
                column: row.get("column_name"),
                constraint_name: row.get("constraint_name"),
                referenced_schema: row.get("referenced_schema"),
                referenced_table: row.get("referenced_table"),
                referenced_column: row.get("referenced_column"),
            })
            .collect())
    }
}

impl EnumCatalogProvider for PostgresCatalog {
    async fn is_enum(&self, type_name: &str) -> Result<bool> {
        let query = r#"
            SELECT EXISTS (
                SELECT 1
                FROM pg_type t
                JOIN pg_enum e ON t.oid = e.enumtypid
                WHERE t.typname = $1
            )
        "#;

        sqlx::query_scalar::<_, bool>(query)
            .bind(type_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TableFillError::EnumCatalog {
                type_name: type_name.to_string(),
                source: e,
            })
    }

    async fn enum_labels(&self, type_name: &str) -> Result<Vec<String>> {
        let query = r#"
            SELECT e.enumlabel::text
            FROM pg_type t
            JOIN pg_enum e ON t.oid = e.enumtypid
            WHERE t.typname = $1
            GROUP BY e.enumlabel
            ORDER BY MIN(e.enumsortorder)
        "#;

        sqlx::query_scalar::<_, String>(query)
            .bind(type_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TableFillError::EnumCatalog {
                type_name: type_name.to_string(),
                source: e,
            })
    }
}

impl RowSink for PostgresCatalog {
    async fn insert_row(&self, row_index: usize, row: &RowPayload) -> Result<()> {
        let sql = build_insert(row);
        debug!("{}", sql);

        let mut query = sqlx::query(&sql);
        for value in row.values.values() {
            query = query.bind(value.to_text());
        }

        query
            .execute(&self.pool)
            .await
            .map_err(|e| TableFillError::InsertFailed {
                table: row.table.clone(),
                row_index,
                message: format!("INSERT of {} columns rejected", row.len()),
                source: e,
            })?;
        Ok(())
    }

    async fn sample_value(&self, table: &str, column: &str) -> Result<Option<Value>> {
        let sql = format!(
            "SELECT {}::text FROM {} ORDER BY random() LIMIT 1",
            quote_identifier(column),
            quote_table(table)
        );

        let sampled = sqlx::query_scalar::<_, Option<String>>(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TableFillError::SampleFailed {
                table: table.to_string(),
                column: column.to_string(),
                source: e,
            })?;

        Ok(sampled.map(|text| match text {
            Some(text) => Value::String(text.into()),
            None => Value::Null,
        }))
    }
}

/// Build a parameterized INSERT for `row`; every placeholder is cast to the
/// type recorded for its column.
fn build_insert(row: &RowPayload) -> String {
    let table = quote_table(&row.table);
    if row.values.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }

    let columns: Vec<String> = row.values.keys().map(|c| quote_identifier(c)).collect();
    let placeholders: Vec<String> = row
        .values
        .keys()
        .enumerate()
        .map(|(i, column)| {
            let cast_type = row.types.get(column).map(String::as_str).unwrap_or("text");
            format!("${}::{}", i + 1, cast_type)
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_table(qualified: &str) -> String {
    match split_qualified(qualified) {
        ("", table) => quote_identifier(table),
        (schema, table) => format!("{}.{}", quote_identifier(schema), quote_identifier(table)),
    }
}

/// Sanitize a database URL for error messages (hide password).
fn sanitize_url(db_url: &str) -> String {
    if let Ok(mut parsed) = url::Url::parse(db_url) {
        if parsed.password().is_some() {
            let _ = parsed.set_password(Some("****"));
        }
        return parsed.to_string();
    }
    db_url.to_string()
}
