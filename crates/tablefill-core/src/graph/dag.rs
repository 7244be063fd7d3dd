use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::error::{Result, TableFillError};
use crate::schema::types::{ColumnRow, DeclaredType, ForeignKeyRow};

/// A directed graph representing table dependencies via foreign keys.
/// Edges point from referenced table to referencing table (parent → child),
/// so a node's incoming edges are its parent relationships.
///
/// Nodes live in the petgraph arena and are addressed by `NodeIndex`; they are
/// only added during `build` and never removed.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    pub graph: DiGraph<TableNode, ForeignKeyRelationship>,
    /// Fully-qualified table name → node, in discovery order.
    pub node_indices: IndexMap<String, NodeIndex>,
}

/// One relation in the schema.
#[derive(Debug, Clone, Serialize)]
pub struct TableNode {
    /// Fully-qualified `schema.table` name.
    pub name: String,
    /// Columns in the order the metadata provider reported them.
    pub columns: Vec<ColumnSpec>,
}

impl TableNode {
    fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: DeclaredType,
    /// Declared type exactly as the catalog reported it.
    pub raw_type: String,
    /// Type the sink casts inserted values to.
    pub cast_type: String,
}

/// A single-column foreign key: `child_table.child_column` references
/// `parent_table.parent_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRelationship {
    pub constraint_name: String,
    pub parent_table: String,
    pub parent_column: String,
    pub child_table: String,
    pub child_column: String,
}

impl SchemaGraph {
    /// Build the graph from raw column and foreign-key metadata.
    ///
    /// Tables are upserted by qualified name the first time they are seen in
    /// either input. Every foreign-key row becomes its own edge, so a child
    /// with two foreign keys into the same parent keeps both.
    pub fn build(columns: &[ColumnRow], foreign_keys: &[ForeignKeyRow]) -> Self {
        let mut schema_graph = Self {
            graph: DiGraph::new(),
            node_indices: IndexMap::new(),
        };

        for row in columns {
            let idx = schema_graph.upsert_table(row.qualified_table());
            schema_graph.graph[idx].columns.push(ColumnSpec {
                name: row.column.clone(),
                declared_type: DeclaredType::from_raw(&row.declared_type),
                raw_type: row.declared_type.clone(),
                cast_type: row.cast_type.clone(),
            });
        }

        for fk in foreign_keys {
            let child_name = fk.qualified_table();
            let parent_name = fk.qualified_referenced_table();
            let child_idx = schema_graph.upsert_table(child_name.clone());
            let parent_idx = schema_graph.upsert_table(parent_name.clone());

            schema_graph.graph.add_edge(
                parent_idx,
                child_idx,
                ForeignKeyRelationship {
                    constraint_name: fk.constraint_name.clone(),
                    parent_table: parent_name,
                    parent_column: fk.referenced_column.clone(),
                    child_table: child_name,
                    child_column: fk.column.clone(),
                },
            );
        }

        schema_graph
    }

    fn upsert_table(&mut self, name: String) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(TableNode::new(name.clone()));
        self.node_indices.insert(name, idx);
        idx
    }

    /// Get the table node at an index.
    pub fn table(&self, idx: NodeIndex) -> &TableNode {
        &self.graph[idx]
    }

    /// Get the table name for a node index.
    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].name
    }

    /// Get node index for a qualified table name.
    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    /// Look up a table by qualified name.
    pub fn table_by_name(&self, table_name: &str) -> Result<&TableNode> {
        self.node_index(table_name)
            .map(|idx| self.table(idx))
            .ok_or_else(|| TableFillError::UnknownTable {
                table: table_name.to_string(),
            })
    }

    /// Child tables of `idx` with the foreign key that links each one, in the
    /// order the keys were discovered. A child appears once per foreign key
    /// pointing at `idx`.
    pub fn children(&self, idx: NodeIndex) -> Vec<(NodeIndex, &ForeignKeyRelationship)> {
        // petgraph walks adjacency lists newest-first
        let mut children: Vec<(NodeIndex, &ForeignKeyRelationship)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight()))
            .collect();
        children.reverse();
        children
    }

    /// Foreign keys declared on `idx`, in discovery order.
    pub fn parent_relationships(&self, idx: NodeIndex) -> Vec<&ForeignKeyRelationship> {
        let mut relationships: Vec<&ForeignKeyRelationship> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| edge.weight())
            .collect();
        relationships.reverse();
        relationships
    }

    /// Tables with no parent other than themselves, in discovery order.
    ///
    /// A self-referencing foreign key does not make a table a non-root; only
    /// edges from other tables do.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .all(|edge| edge.source() == idx)
            })
            .collect()
    }

    /// Whether `idx` has a foreign key into itself.
    pub fn is_self_referencing(&self, idx: NodeIndex) -> bool {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .any(|edge| edge.source() == idx)
    }

    /// All table nodes in discovery order.
    pub fn tables(&self) -> impl Iterator<Item = (NodeIndex, &TableNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Get all qualified table names in discovery order.
    pub fn table_names(&self) -> Vec<&str> {
        self.node_indices.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of tables.
    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of FK edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_metadata() -> (Vec<ColumnRow>, Vec<ForeignKeyRow>) {
        let columns = vec![
            ColumnRow::new("public", "users", "id", "bigint"),
            ColumnRow::new("public", "users", "email", "text"),
            ColumnRow::new("public", "orders", "id", "bigint"),
            ColumnRow::new("public", "orders", "user_id", "bigint"),
            ColumnRow::new("public", "orders", "status", "order_status"),
            ColumnRow::new("public", "order_items", "id", "bigint"),
            ColumnRow::new("public", "order_items", "order_id", "bigint"),
        ];
        let foreign_keys = vec![
            ForeignKeyRow::new(
                "orders_user_id_fkey",
                ("public", "orders", "user_id"),
                ("public", "users", "id"),
            ),
            ForeignKeyRow::new(
                "items_order_id_fkey",
                ("public", "order_items", "order_id"),
                ("public", "orders", "id"),
            ),
        ];
        (columns, foreign_keys)
    }

    #[test]
    fn test_build_graph() {
        let (columns, foreign_keys) = make_test_metadata();
        let graph = SchemaGraph::build(&columns, &foreign_keys);

        assert_eq!(graph.table_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.table_names(),
            vec!["public.users", "public.orders", "public.order_items"]
        );

        let orders = graph.table_by_name("public.orders").unwrap();
        let names: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_id", "status"]);
        assert_eq!(
            orders.columns[2].declared_type,
            DeclaredType::Named("order_status".to_string())
        );
    }

    #[test]
    fn test_edges_point_parent_to_child() {
        let (columns, foreign_keys) = make_test_metadata();
        let graph = SchemaGraph::build(&columns, &foreign_keys);

        let users = graph.node_index("public.users").unwrap();
        let orders = graph.node_index("public.orders").unwrap();

        let children = graph.children(users);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].0, orders);
        assert_eq!(children[0].1.constraint_name, "orders_user_id_fkey");
        let parents = graph.parent_relationships(orders);
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].parent_table, "public.users");
        assert_eq!(parents[0].parent_column, "id");
        assert_eq!(parents[0].child_column, "user_id");
        assert_eq!(parents[0].constraint_name, "orders_user_id_fkey");
        assert_eq!(graph.roots(), vec![users]);
    }

    #[test]
    fn test_foreign_key_upserts_unseen_tables() {
        let foreign_keys = vec![ForeignKeyRow::new(
            "audit_actor_fkey",
            ("audit", "events", "actor_id"),
            ("public", "users", "id"),
        )];
        let graph = SchemaGraph::build(&[], &foreign_keys);

        assert_eq!(graph.table_count(), 2);
        assert!(graph.table_by_name("audit.events").unwrap().columns.is_empty());
        assert!(graph.node_index("public.users").is_some());
    }

    #[test]
    fn test_column_spec_keeps_cast_type() {
        let columns = vec![
            ColumnRow::new("ref", "countries", "code", "character varying")
                .with_cast_type("pg_catalog.\"varchar\""),
            ColumnRow::new("public", "customers", "country_code", "character varying")
                .with_cast_type("pg_catalog.\"varchar\""),
        ];
        let foreign_keys = vec![ForeignKeyRow::new(
            "customers_country_code_fkey",
            ("public", "customers", "country_code"),
            ("ref", "countries", "code"),
        )];
        let graph = SchemaGraph::build(&columns, &foreign_keys);

        let customers = graph.table_by_name("public.customers").unwrap();
        assert_eq!(customers.columns[0].declared_type, DeclaredType::Text);
        assert_eq!(customers.columns[0].cast_type, "pg_catalog.\"varchar\"");

        let countries = graph.node_index("ref.countries").unwrap();
        assert_eq!(graph.roots(), vec![countries]);
        let parents = graph.parent_relationships(graph.node_index("public.customers").unwrap());
        assert_eq!(parents[0].parent_table, "ref.countries");
        assert_eq!(parents[0].parent_column, "code");
    }

    #[test]
    fn test_same_table_name_in_two_schemas() {
        let columns = vec![
            ColumnRow::new("public", "users", "id", "bigint"),
            ColumnRow::new("archive", "users", "id", "bigint"),
        ];
        let graph = SchemaGraph::build(&columns, &[]);
        assert_eq!(graph.table_count(), 2);
    }

    #[test]
    fn test_multiple_foreign_keys_to_same_parent() {
        let columns = vec![
            ColumnRow::new("public", "accounts", "id", "bigint"),
            ColumnRow::new("public", "transfers", "from_id", "bigint"),
            ColumnRow::new("public", "transfers", "to_id", "bigint"),
        ];
        let foreign_keys = vec![
            ForeignKeyRow::new(
                "transfers_from_fkey",
                ("public", "transfers", "from_id"),
                ("public", "accounts", "id"),
            ),
            ForeignKeyRow::new(
                "transfers_to_fkey",
                ("public", "transfers", "to_id"),
                ("public", "accounts", "id"),
            ),
        ];
        let graph = SchemaGraph::build(&columns, &foreign_keys);
        let transfers = graph.node_index("public.transfers").unwrap();

        let child_columns: Vec<&str> = graph
            .parent_relationships(transfers)
            .iter()
            .map(|r| r.child_column.as_str())
            .collect();
        assert_eq!(child_columns, vec!["from_id", "to_id"]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_self_reference_is_still_root() {
        let columns = vec![
            ColumnRow::new("public", "categories", "id", "bigint"),
            ColumnRow::new("public", "categories", "parent_id", "bigint"),
        ];
        let foreign_keys = vec![ForeignKeyRow::new(
            "categories_parent_fkey",
            ("public", "categories", "parent_id"),
            ("public", "categories", "id"),
        )];
        let graph = SchemaGraph::build(&columns, &foreign_keys);
        let categories = graph.node_index("public.categories").unwrap();

        assert!(graph.is_self_referencing(categories));
        assert_eq!(graph.roots(), vec![categories]);
    }

    #[test]
    fn test_unknown_table_lookup() {
        let graph = SchemaGraph::build(&[], &[]);
        assert!(matches!(
            graph.table_by_name("public.missing"),
            Err(TableFillError::UnknownTable { .. })
        ));
    }
}
