//! # Row Synthesizer
//!
//! Builds one `RowPayload` for a table. Each column (except the `id` identity
//! column, which the database fills) is resolved in this order:
//!
//! 1. **Foreign key**: the value is sampled from an existing parent row
//!    through a `ParentRowResolver`. Every relationship samples on its own,
//!    even when two of them point at the same parent table.
//! 2. **Enum**: a named type the enum catalog recognizes gets one of its
//!    labels, chosen uniformly. Membership and labels go through `EnumCache`.
//! 3. **Primitive**: generated from the declared type (and, for text, the
//!    column name) by `providers::generate_primitive`.
//!
//! Columns whose declared type is none of the above are left out of the row
//! and listed in `RowPayload::omitted`. If such a column is NOT NULL the insert
//! fails later, at the sink.

use std::collections::HashSet;
use std::future::Future;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{Result, TableFillError};
use crate::generate::enum_cache::EnumCache;
use crate::generate::providers::generate_primitive;
use crate::generate::row::RowPayload;
use crate::generate::value::Value;
use crate::graph::dag::{ForeignKeyRelationship, TableNode};
use crate::schema::introspect::{EnumCatalogProvider, RowSink};
use crate::schema::types::DeclaredType;

/// Identity column left to the database.
pub const IDENTITY_COLUMN: &str = "id";

/// Supplies the value of a foreign-key column from an already-filled parent.
pub trait ParentRowResolver: Send + Sync {
    fn resolve(
        &self,
        relationship: &ForeignKeyRelationship,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Resolves parent rows by sampling the sink the rows were inserted into.
pub struct SinkResolver<'a, S> {
    sink: &'a S,
}

impl<'a, S: RowSink> SinkResolver<'a, S> {
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }
}

impl<S: RowSink> ParentRowResolver for SinkResolver<'_, S> {
    async fn resolve(&self, relationship: &ForeignKeyRelationship) -> Result<Value> {
        let sampled = self
            .sink
            .sample_value(&relationship.parent_table, &relationship.parent_column)
            .await?;

        sampled.ok_or_else(|| TableFillError::EmptyParentTable {
            constraint: relationship.constraint_name.clone(),
            child_table: relationship.child_table.clone(),
            child_column: relationship.child_column.clone(),
            parent_table: relationship.parent_table.clone(),
            parent_column: relationship.parent_column.clone(),
        })
    }
}

/// Generates rows for one fill run. Owns the random source and the enum cache.
pub struct RowSynthesizer {
    rng: StdRng,
    enums: EnumCache,
    /// (table, column) pairs already warned about as unsupported.
    warned_unsupported: HashSet<(String, String)>,
}

impl RowSynthesizer {
    /// Deterministic synthesizer for a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Synthesizer seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            enums: EnumCache::new(),
            warned_unsupported: HashSet::new(),
        }
    }

    pub fn enum_cache(&self) -> &EnumCache {
        &self.enums
    }

    /// Synthesize one row for `table`.
    ///
    /// `parents` are the foreign keys declared on `table`. The returned payload
    /// holds a value and declared type for every column except `id` and the
    /// unsupported ones.
    pub async fn synthesize_row<E, R>(
        &mut self,
        table: &TableNode,
        parents: &[&ForeignKeyRelationship],
        enum_catalog: &E,
        resolver: &R,
    ) -> Result<RowPayload>
    where
        E: EnumCatalogProvider,
        R: ParentRowResolver,
    {
        let mut row = RowPayload::new(&table.name);

        for column in &table.columns {
            if column.name == IDENTITY_COLUMN {
                continue;
            }

            if let Some(relationship) = parents.iter().find(|r| r.child_column == column.name) {
                let value = resolver.resolve(relationship).await?;
                debug!(
                    "{}.{} = {} (from {}.{})",
                    table.name,
                    column.name,
                    value,
                    relationship.parent_table,
                    relationship.parent_column
                );
                row.insert(&column.name, &column.cast_type, value);
                continue;
            }

            if let DeclaredType::Named(type_name) = &column.declared_type {
                if self.enums.is_enum(enum_catalog, type_name).await? {
                    let labels = self.enums.labels(enum_catalog, type_name).await?;
                    if labels.is_empty() {
                        return Err(TableFillError::EmptyEnum {
                            type_name: type_name.clone(),
                        });
                    }
                    let label = labels[self.rng.random_range(0..labels.len())].clone();
                    debug!("{}.{} = {} (enum)", table.name, column.name, label);
                    row.insert(&column.name, &column.cast_type, Value::String(label.into()));
                    continue;
                }
            }

            match generate_primitive(&column.declared_type, &column.name, &mut self.rng) {
                Some(value) => {
                    debug!("{}.{} = {}", table.name, column.name, value);
                    row.insert(&column.name, &column.cast_type, value);
                }
                None => {
                    let key = (table.name.clone(), column.name.clone());
                    if self.warned_unsupported.insert(key) {
                        warn!(
                            "Unsupported type '{}' for {}.{}; the column is left out of every row",
                            column.raw_type, table.name, column.name
                        );
                    }
                    row.omitted.push(column.name.clone());
                }
            }
        }

        Ok(row)
    }
}
