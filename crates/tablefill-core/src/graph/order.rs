use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::{DfsPostOrder, EdgeRef, VisitMap};
use tracing::{debug, warn};

use crate::graph::dag::{ForeignKeyRelationship, SchemaGraph};

/// Result of fill-order planning: every table exactly once, parents before
/// children wherever the foreign keys allow it.
#[derive(Debug, Clone)]
pub struct FillOrder {
    /// Tables in the order they should be filled.
    pub tables: Vec<NodeIndex>,
    /// Groups of tables whose foreign keys form a cycle (including a table
    /// referencing itself). The order cannot satisfy these.
    pub cycles: Vec<Vec<String>>,
}

impl FillOrder {
    /// Qualified table names in fill order.
    pub fn table_names<'a>(&self, graph: &'a SchemaGraph) -> Vec<&'a str> {
        self.tables
            .iter()
            .map(|&idx| graph.table_name(idx))
            .collect()
    }

    /// Position of every table in the order.
    pub fn positions(&self) -> HashMap<NodeIndex, usize> {
        self.tables
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (idx, pos))
            .collect()
    }

    /// Foreign keys whose parent is not filled strictly before the child.
    /// Empty for every acyclic graph; self references are always listed.
    pub fn violations<'a>(&self, graph: &'a SchemaGraph) -> Vec<&'a ForeignKeyRelationship> {
        let positions = self.positions();
        graph
            .graph
            .edge_references()
            .filter(|edge| {
                match (positions.get(&edge.source()), positions.get(&edge.target())) {
                    (Some(parent), Some(child)) => parent >= child,
                    _ => true,
                }
            })
            .map(|edge| edge.weight())
            .collect()
    }
}

/// Compute the fill order of the schema graph.
///
/// A depth-first postorder walk starts at every root (in discovery order) and
/// shares one visited set, so a table reachable from several roots is emitted
/// once. Tables left unvisited afterwards belong to cycles with no root above
/// them; the walk restarts from each of those in discovery order. Reversing
/// the combined postorder puts every parent before its children.
///
/// Cycles are tolerated, not resolved: the visited guard stops the walk, and
/// the affected tables are reported in `FillOrder::cycles`.
pub fn plan_fill_order(graph: &SchemaGraph) -> FillOrder {
    let mut dfs = DfsPostOrder::empty(&graph.graph);
    let mut postorder = Vec::with_capacity(graph.table_count());

    let roots = graph.roots();
    debug!(
        "Fill order roots: {:?}",
        roots
            .iter()
            .map(|&idx| graph.table_name(idx))
            .collect::<Vec<_>>()
    );

    for root in roots {
        if dfs.discovered.is_visited(&root) {
            continue;
        }
        dfs.move_to(root);
        while let Some(idx) = dfs.next(&graph.graph) {
            postorder.push(idx);
        }
    }

    // Pure cycles have no root; walk them from their first discovered table.
    for idx in graph.graph.node_indices() {
        if dfs.discovered.is_visited(&idx) {
            continue;
        }
        dfs.move_to(idx);
        while let Some(next) = dfs.next(&graph.graph) {
            postorder.push(next);
        }
    }

    postorder.reverse();

    let cycles = find_cycles(graph);
    for cycle in &cycles {
        warn!(
            "Foreign keys form a cycle between {}; the fill order cannot satisfy it",
            cycle.join(", ")
        );
    }

    FillOrder {
        tables: postorder,
        cycles,
    }
}

/// Strongly connected components with more than one table, plus tables that
/// reference themselves.
fn find_cycles(graph: &SchemaGraph) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.is_self_referencing(scc[0]))
        .map(|mut scc| {
            scc.sort();
            scc.iter()
                .map(|&idx| graph.table_name(idx).to_string())
                .collect()
        })
        .collect();
    cycles.sort();
    cycles
}
