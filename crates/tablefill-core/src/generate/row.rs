use indexmap::IndexMap;
use serde::Serialize;

use crate::generate::value::Value;

/// A synthesized row, ready to hand to a `RowSink`.
///
/// The sink owns serialization and parameterization; the payload only carries
/// values and the type each one is cast to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowPayload {
    /// Qualified `schema.table` name.
    pub table: String,
    /// Column → value, in column discovery order.
    pub values: IndexMap<String, Value>,
    /// Column → type expression the sink casts the value to.
    pub types: IndexMap<String, String>,
    /// Columns left out because their declared type is not supported.
    /// The database may still reject the row if one of these is NOT NULL.
    pub omitted: Vec<String>,
}

impl RowPayload {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: IndexMap::new(),
            types: IndexMap::new(),
            omitted: Vec::new(),
        }
    }

    /// Record a value and the type it is cast to.
    pub fn insert(&mut self, column: &str, cast_type: &str, value: Value) {
        self.values.insert(column.to_string(), value);
        self.types.insert(column.to_string(), cast_type.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
