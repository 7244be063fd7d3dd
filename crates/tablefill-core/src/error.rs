//! # Error Types
//!
//! Defines `TableFillError`, the unified error enum for every failure mode in
//! the tablefill pipeline. Every failure is fatal: nothing is retried, and a
//! run either completes or stops at the first error. Variants carry the table
//! and column context needed to see which step of the fill broke.

use thiserror::Error;

/// All errors that can occur in tablefill operations.
#[derive(Error, Debug)]
pub enum TableFillError {
    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema introspection failed on query '{query}': {source}")]
    Introspection {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("No database URL provided. tablefill looks for a connection in this order:\n  1. --db flag\n  2. DATABASE_URL environment variable\n  3. .env file with DATABASE_URL\n  4. tablefill.toml [database] section\n\nExample: tablefill fill --db postgres://localhost/myapp --rows 10")]
    NoDatabaseUrl,

    #[error("Unsupported database scheme '{scheme}'. Supported: postgres://, postgresql://")]
    UnsupportedDatabase { scheme: String },

    #[error("Enum catalog lookup failed for type '{type_name}': {source}")]
    EnumCatalog {
        type_name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Enum type '{type_name}' has no labels to choose from")]
    EmptyEnum { type_name: String },

    #[error("Parent table is empty: {child_table}.{child_column} references {parent_table}.{parent_column} (constraint {constraint}), but {parent_table} has no rows\n  The fill order placed {child_table} before its parent, or the foreign keys form a cycle")]
    EmptyParentTable {
        constraint: String,
        child_table: String,
        child_column: String,
        parent_table: String,
        parent_column: String,
    },

    #[error("Sampling a row from {table}.{column} failed: {source}")]
    SampleFailed {
        table: String,
        column: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert failed on {table} row {row_index}: {message}\n  DB error: {source}")]
    InsertFailed {
        table: String,
        row_index: usize,
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Table '{table}' is not part of the schema graph")]
    UnknownTable { table: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TableFillError>;
