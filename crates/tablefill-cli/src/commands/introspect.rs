use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use serde::Serialize;

use tablefill_core::graph::dag::{ColumnSpec, ForeignKeyRelationship, SchemaGraph};
use tablefill_core::schema::introspect::introspect_graph;

use crate::args::{IntrospectArgs, IntrospectFormat};

#[derive(Serialize)]
struct TableReport<'a> {
    name: &'a str,
    columns: &'a [ColumnSpec],
    foreign_keys: Vec<&'a ForeignKeyRelationship>,
}

pub async fn run(args: &IntrospectArgs) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::connect(args.db.as_deref(), config.as_ref(), &[]).await?;
    let graph = introspect_graph(&catalog)
        .await
        .context("Failed to introspect schema")?;

    match args.format {
        IntrospectFormat::Json => {
            let json = serde_json::to_string_pretty(&table_reports(&graph))?;
            println!("{}", json);
        }
        IntrospectFormat::Table => {
            let column_count: usize = graph.tables().map(|(_, t)| t.columns.len()).sum();
            println!(
                "Tables: {}  Columns: {}  Foreign Keys: {}",
                graph.table_count(),
                column_count,
                graph.edge_count()
            );
            println!();

            for (idx, table) in graph.tables() {
                println!("━━━ {} ━━━", table.name);

                let parents = graph.parent_relationships(idx);
                let mut t = ComfyTable::new();
                t.set_header(vec!["Column", "Type", "FK"]);
                for column in &table.columns {
                    let fk_target = parents
                        .iter()
                        .find(|fk| fk.child_column == column.name)
                        .map(|fk| format!("→ {}.{}", fk.parent_table, fk.parent_column));
                    t.add_row(vec![
                        Cell::new(&column.name),
                        Cell::new(&column.raw_type),
                        Cell::new(fk_target.as_deref().unwrap_or("")),
                    ]);
                }

                println!("{}", t);
                println!();
            }
        }
    }

    Ok(())
}

fn table_reports(graph: &SchemaGraph) -> Vec<TableReport<'_>> {
    graph
        .tables()
        .map(|(idx, table)| TableReport {
            name: &table.name,
            columns: &table.columns,
            foreign_keys: graph.parent_relationships(idx),
        })
        .collect()
}
