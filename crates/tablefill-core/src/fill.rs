//! # Fill Orchestrator
//!
//! Walks the fill order and, for each table, synthesizes and inserts rows one
//! at a time. Each row reaches the sink before the next one is synthesized, so
//! by the time a child table starts, every parent row is already visible to
//! parent sampling. The first error stops the run.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::generate::synthesizer::{RowSynthesizer, SinkResolver};
use crate::graph::dag::SchemaGraph;
use crate::graph::order::{plan_fill_order, FillOrder};
use crate::schema::introspect::{
    introspect_graph, EnumCatalogProvider, RowSink, SchemaMetadataProvider,
};

/// Rows inserted per table unless overridden.
pub const DEFAULT_ROWS_PER_TABLE: usize = 10;

/// How many rows to generate and with which seed.
#[derive(Debug, Clone)]
pub struct FillOptions {
    pub default_rows: usize,
    /// Per-table row counts keyed by qualified table name.
    pub table_rows: BTreeMap<String, usize>,
    /// Fixed seed for the synthesizer; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            default_rows: DEFAULT_ROWS_PER_TABLE,
            table_rows: BTreeMap::new(),
            seed: None,
        }
    }
}

impl FillOptions {
    pub fn rows_for(&self, table: &str) -> usize {
        self.table_rows
            .get(table)
            .copied()
            .unwrap_or(self.default_rows)
    }

    pub fn synthesizer(&self) -> RowSynthesizer {
        match self.seed {
            Some(seed) => RowSynthesizer::new(seed),
            None => RowSynthesizer::from_entropy(),
        }
    }
}

/// What a completed fill inserted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    /// Rows inserted per table, in fill order.
    pub tables: IndexMap<String, usize>,
    /// Columns left out of every row of a table because of an unsupported type.
    pub omitted_columns: IndexMap<String, Vec<String>>,
}

impl FillReport {
    pub fn total_rows(&self) -> usize {
        self.tables.values().sum()
    }
}

/// Fill every table of `graph` in `order`.
///
/// `progress` receives `(table, rows_done, total_rows)` after each insert.
pub async fn fill_tables<E, S>(
    graph: &SchemaGraph,
    order: &FillOrder,
    options: &FillOptions,
    synthesizer: &mut RowSynthesizer,
    enum_catalog: &E,
    sink: &S,
    progress: Option<&dyn Fn(&str, usize, usize)>,
) -> Result<FillReport>
where
    E: EnumCatalogProvider,
    S: RowSink,
{
    let resolver = SinkResolver::new(sink);
    let mut report = FillReport::default();

    let total_rows: usize = order
        .tables
        .iter()
        .map(|&idx| options.rows_for(graph.table_name(idx)))
        .sum();
    let mut rows_done = 0usize;

    for &idx in &order.tables {
        let table = graph.table(idx);
        let parents = graph.parent_relationships(idx);
        let row_count = options.rows_for(&table.name);
        info!("Filling {} with {} rows", table.name, row_count);

        for row_index in 0..row_count {
            let row = synthesizer
                .synthesize_row(table, &parents, enum_catalog, &resolver)
                .await?;

            if row_index == 0 && !row.omitted.is_empty() {
                report
                    .omitted_columns
                    .insert(table.name.clone(), row.omitted.clone());
            }

            sink.insert_row(row_index, &row).await?;

            rows_done += 1;
            if let Some(cb) = progress {
                cb(&table.name, rows_done, total_rows);
            }
        }

        report.tables.insert(table.name.clone(), row_count);
    }

    info!(
        "Filled {} tables with {} rows",
        report.tables.len(),
        report.total_rows()
    );
    Ok(report)
}

/// Everything one end-to-end run produced.
#[derive(Debug)]
pub struct FillRun {
    pub graph: SchemaGraph,
    pub order: FillOrder,
    pub report: FillReport,
}

/// Introspect, plan, and fill in one call.
pub async fn run_fill<M, E, S>(
    metadata: &M,
    enum_catalog: &E,
    sink: &S,
    options: &FillOptions,
    progress: Option<&dyn Fn(&str, usize, usize)>,
) -> Result<FillRun>
where
    M: SchemaMetadataProvider,
    E: EnumCatalogProvider,
    S: RowSink,
{
    let graph = introspect_graph(metadata).await?;
    let order = plan_fill_order(&graph);
    let mut synthesizer = options.synthesizer();

    let report = fill_tables(
        &graph,
        &order,
        options,
        &mut synthesizer,
        enum_catalog,
        sink,
        progress,
    )
    .await?;

    Ok(FillRun {
        graph,
        order,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_for_uses_overrides() {
        let mut options = FillOptions::default();
        options.table_rows.insert("public.orders".to_string(), 25);

        assert_eq!(options.rows_for("public.orders"), 25);
        assert_eq!(options.rows_for("public.customers"), DEFAULT_ROWS_PER_TABLE);
    }

    #[test]
    fn test_report_total() {
        let mut report = FillReport::default();
        report.tables.insert("public.a".to_string(), 3);
        report.tables.insert("public.b".to_string(), 4);
        assert_eq!(report.total_rows(), 7);
    }
}
