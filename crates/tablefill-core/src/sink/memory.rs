//! # In-Memory Row Sink
//!
//! Keeps inserted rows in process memory instead of a database. The sink plays
//! the part of the storage layer's identity mechanism: a row inserted without
//! an `id` gets the next sequential integer for its table, so child tables can
//! reference it. Used by `tablefill preview` and by tests.

use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::generate::row::RowPayload;
use crate::generate::synthesizer::IDENTITY_COLUMN;
use crate::generate::value::Value;
use crate::schema::introspect::RowSink;

/// Stored rows, keyed by table in first-insert order.
pub type StoredTables = IndexMap<String, Vec<IndexMap<String, Value>>>;

pub struct MemorySink {
    tables: Mutex<StoredTables>,
    rng: Mutex<StdRng>,
}

impl MemorySink {
    pub fn new(seed: u64) -> Self {
        Self {
            tables: Mutex::new(IndexMap::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn tables(&self) -> MutexGuard<'_, StoredTables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the rows stored for `table`.
    pub fn rows(&self, table: &str) -> Vec<IndexMap<String, Value>> {
        self.tables().get(table).cloned().unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables().get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Every value stored in `table.column`, in insertion order.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<Value> {
        self.tables()
            .get(table)
            .map(|rows| rows.iter().filter_map(|row| row.get(column).cloned()).collect())
            .unwrap_or_default()
    }

    /// Consume the sink and return everything it stored.
    pub fn into_tables(self) -> StoredTables {
        self.tables
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RowSink for MemorySink {
    async fn insert_row(&self, _row_index: usize, row: &RowPayload) -> Result<()> {
        let mut tables = self.tables();
        let rows = tables.entry(row.table.clone()).or_default();

        let mut stored = IndexMap::with_capacity(row.values.len() + 1);
        if !row.values.contains_key(IDENTITY_COLUMN) {
            stored.insert(IDENTITY_COLUMN.to_string(), Value::Int(rows.len() as i64 + 1));
        }
        for (column, value) in &row.values {
            stored.insert(column.clone(), value.clone());
        }
        rows.push(stored);
        Ok(())
    }

    async fn sample_value(&self, table: &str, column: &str) -> Result<Option<Value>> {
        let tables = self.tables();
        let candidates: Vec<&Value> = match tables.get(table) {
            Some(rows) => rows.iter().filter_map(|row| row.get(column)).collect(),
            None => return Ok(None),
        };
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let picked = candidates[rng.random_range(0..candidates.len())].clone();
        Ok(Some(picked))
    }
}
