use serde::{Deserialize, Serialize};
use std::fmt;

/// Schemas that never hold user tables and are excluded from introspection.
pub const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema"];

/// One row of column metadata, as returned by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    /// Declared type as reported by the catalog (`bigint`, `text`, an enum
    /// type name, ...).
    pub declared_type: String,
    /// Type expression a sink casts bound values to, e.g. `pg_catalog."varchar"`
    /// or `sales.order_status`. Defaults to the declared type.
    #[serde(default)]
    pub cast_type: String,
}

impl ColumnRow {
    pub fn new(schema: &str, table: &str, column: &str, declared_type: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            column: column.to_string(),
            declared_type: declared_type.to_string(),
            cast_type: declared_type.to_string(),
        }
    }

    pub fn with_cast_type(mut self, cast_type: &str) -> Self {
        self.cast_type = cast_type.to_string();
        self
    }

    pub fn qualified_table(&self) -> String {
        qualified_name(&self.schema, &self.table)
    }
}

/// One row of foreign-key metadata: `schema.table.column` references
/// `referenced_schema.referenced_table.referenced_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub constraint_name: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyRow {
    /// Build a row from `(schema, table, column)` referencing
    /// `(schema, table, column)`.
    pub fn new(
        constraint_name: &str,
        child: (&str, &str, &str),
        parent: (&str, &str, &str),
    ) -> Self {
        Self {
            schema: child.0.to_string(),
            table: child.1.to_string(),
            column: child.2.to_string(),
            constraint_name: constraint_name.to_string(),
            referenced_schema: parent.0.to_string(),
            referenced_table: parent.1.to_string(),
            referenced_column: parent.2.to_string(),
        }
    }

    pub fn qualified_table(&self) -> String {
        qualified_name(&self.schema, &self.table)
    }

    pub fn qualified_referenced_table(&self) -> String {
        qualified_name(&self.referenced_schema, &self.referenced_table)
    }
}

/// Join a schema and table into the `schema.table` key used by the graph.
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Split a `schema.table` key back into its parts. Unqualified names are
/// returned with an empty schema.
pub fn split_qualified(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (schema, table),
        None => ("", name),
    }
}

/// Declared primitive type of a column.
///
/// Everything the catalog reports that is not one of the primitives below is
/// kept as `Named`. A named type is either an enum (decided later through the
/// enum catalog) or an unsupported type the synthesizer will omit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    /// 64-bit integer (bigint, int8)
    BigInt,
    /// 16- or 32-bit integer (smallint, int2, integer, int, int4)
    Integer,
    /// Character data (text, character varying, varchar)
    Text,
    /// Boolean
    Boolean,
    /// Floating point (real, double precision)
    Float,
    /// Calendar timestamp (date, timestamp with or without time zone)
    Timestamp,
    /// JSON stored as text (json, jsonb)
    Json,
    /// Enum type name or an unrecognized type
    Named(String),
}

impl DeclaredType {
    /// Parse a raw catalog type string into a `DeclaredType`.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "bigint" | "int8" => DeclaredType::BigInt,
            "integer" | "int" | "int4" | "smallint" | "int2" => DeclaredType::Integer,
            "text" | "character varying" | "varchar" => DeclaredType::Text,
            "boolean" | "bool" => DeclaredType::Boolean,
            "real" | "float4" | "double precision" | "float8" => DeclaredType::Float,
            "date"
            | "timestamp"
            | "timestamptz"
            | "timestamp without time zone"
            | "timestamp with time zone" => DeclaredType::Timestamp,
            "json" | "jsonb" => DeclaredType::Json,
            _ => DeclaredType::Named(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::BigInt => write!(f, "bigint"),
            DeclaredType::Integer => write!(f, "integer"),
            DeclaredType::Text => write!(f, "text"),
            DeclaredType::Boolean => write!(f, "boolean"),
            DeclaredType::Float => write!(f, "real"),
            DeclaredType::Timestamp => write!(f, "timestamp"),
            DeclaredType::Json => write!(f, "jsonb"),
            DeclaredType::Named(name) => write!(f, "{}", name),
        }
    }
}
