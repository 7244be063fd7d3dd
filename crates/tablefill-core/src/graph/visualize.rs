use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::graph::dag::{ForeignKeyRelationship, SchemaGraph};
use crate::graph::order::FillOrder;

/// Output format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    /// Indented parent → child tree, one per root, each child tagged with
    /// the foreign key that links it to its parent.
    Tree,
}

/// Generate a visualization of the schema graph. Cycles reported in `order`
/// are drawn dashed (Mermaid, DOT) or marked in place (tree).
pub fn visualize(graph: &SchemaGraph, order: &FillOrder, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph, order),
        GraphFormat::Dot => generate_dot(graph, order),
        GraphFormat::Tree => generate_tree(graph),
    }
}

/// Mermaid node ids cannot contain dots.
fn mermaid_id(table: &str) -> String {
    table.replace('.', "_")
}

fn in_cycle(order: &FillOrder, parent: &str, child: &str) -> bool {
    order
        .cycles
        .iter()
        .any(|cycle| cycle.iter().any(|t| t == parent) && cycle.iter().any(|t| t == child))
}

fn generate_mermaid(graph: &SchemaGraph, order: &FillOrder) -> String {
    let mut output = String::from("graph TD\n");

    for (_, table) in graph.tables() {
        output.push_str(&format!(
            "    {}[{}]\n",
            mermaid_id(&table.name),
            table.name
        ));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let fk = edge.weight();
        let arrow = if in_cycle(order, &fk.parent_table, &fk.child_table) {
            "-.->"
        } else {
            "-->"
        };
        output.push_str(&format!(
            "    {} {}|{}| {}\n",
            mermaid_id(&fk.parent_table),
            arrow,
            fk.child_column,
            mermaid_id(&fk.child_table)
        ));
    }

    if !order.cycles.is_empty() {
        output.push_str("\n    %% Dashed edges are part of a foreign-key cycle\n");
    }

    output
}

fn generate_dot(graph: &SchemaGraph, order: &FillOrder) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for (_, table) in graph.tables() {
        output.push_str(&format!("    \"{}\";\n", table.name));
    }

    for edge in graph.graph.edge_references() {
        let fk = edge.weight();
        let style = if in_cycle(order, &fk.parent_table, &fk.child_table) {
            ", style=dashed, color=red"
        } else {
            ""
        };
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"{}];\n",
            fk.parent_table, fk.child_table, fk.child_column, style
        ));
    }

    output.push_str("}\n");
    output
}

/// Print every root with its descendants indented below it. A table reached
/// again on the current path is marked `(cycle)` and not expanded. Tables no
/// root reaches get their own tree afterwards.
///
/// ```text
/// public.customers
///   public.orders [orders_customer_id_fkey: public.customers.id -> public.orders.customer_id]
/// ```
fn generate_tree(graph: &SchemaGraph) -> String {
    let mut output = String::new();
    let mut printed = HashSet::new();

    for root in graph.roots() {
        let mut path = Vec::new();
        write_subtree(graph, root, None, 0, &mut path, &mut printed, &mut output);
    }

    for (idx, _) in graph.tables() {
        if !printed.contains(&idx) {
            let mut path = Vec::new();
            write_subtree(graph, idx, None, 0, &mut path, &mut printed, &mut output);
        }
    }

    output
}

/// `name: parent.col -> child.col`
fn constraint_label(fk: &ForeignKeyRelationship) -> String {
    format!(
        "{}: {}.{} -> {}.{}",
        fk.constraint_name, fk.parent_table, fk.parent_column, fk.child_table, fk.child_column
    )
}

fn write_subtree(
    graph: &SchemaGraph,
    idx: NodeIndex,
    via: Option<&ForeignKeyRelationship>,
    depth: usize,
    path: &mut Vec<NodeIndex>,
    printed: &mut HashSet<NodeIndex>,
    output: &mut String,
) {
    let indent = "  ".repeat(depth);
    let name = graph.table_name(idx);
    let constraint = via
        .map(|fk| format!(" [{}]", constraint_label(fk)))
        .unwrap_or_default();
    if path.contains(&idx) {
        output.push_str(&format!("{}{} (cycle){}\n", indent, name, constraint));
        return;
    }

    output.push_str(&format!("{}{}{}\n", indent, name, constraint));
    printed.insert(idx);
    path.push(idx);
    for (child, fk) in graph.children(idx) {
        write_subtree(graph, child, Some(fk), depth + 1, path, printed, output);
    }
    path.pop();
}
