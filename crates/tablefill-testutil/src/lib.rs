use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use tablefill_core::error::{Result, TableFillError};
use tablefill_core::generate::row::RowPayload;
use tablefill_core::generate::value::Value;
use tablefill_core::schema::introspect::{EnumCatalogProvider, RowSink, SchemaMetadataProvider};
use tablefill_core::schema::types::{ColumnRow, ForeignKeyRow};

/// Schema metadata served from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    pub columns: Vec<ColumnRow>,
    pub foreign_keys: Vec<ForeignKeyRow>,
}

impl StaticMetadata {
    pub fn new(columns: Vec<ColumnRow>, foreign_keys: Vec<ForeignKeyRow>) -> Self {
        Self {
            columns,
            foreign_keys,
        }
    }
}

impl SchemaMetadataProvider for StaticMetadata {
    async fn columns(&self) -> Result<Vec<ColumnRow>> {
        Ok(self.columns.clone())
    }

    async fn foreign_keys(&self) -> Result<Vec<ForeignKeyRow>> {
        Ok(self.foreign_keys.clone())
    }
}

/// Enum catalog served from memory. Counts every lookup so tests can assert
/// that the cache keeps repeat questions away from the catalog.
#[derive(Debug, Default)]
pub struct StaticEnumCatalog {
    enums: IndexMap<String, Vec<String>>,
    membership_calls: AtomicUsize,
    label_calls: AtomicUsize,
}

impl StaticEnumCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum type and its labels.
    pub fn with_enum(mut self, type_name: &str, labels: &[&str]) -> Self {
        self.enums.insert(
            type_name.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn membership_calls(&self) -> usize {
        self.membership_calls.load(Ordering::SeqCst)
    }

    pub fn label_calls(&self) -> usize {
        self.label_calls.load(Ordering::SeqCst)
    }
}

impl EnumCatalogProvider for StaticEnumCatalog {
    async fn is_enum(&self, type_name: &str) -> Result<bool> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.enums.contains_key(type_name))
    }

    async fn enum_labels(&self, type_name: &str) -> Result<Vec<String>> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.enums.get(type_name).cloned().unwrap_or_default())
    }
}

/// Sink that rejects every insert into one table, the way a database rejects
/// a row that violates a NOT NULL or CHECK constraint. Other tables pass
/// through to the wrapped sink.
pub struct RejectingSink<S> {
    inner: S,
    rejected_table: String,
}

impl<S> RejectingSink<S> {
    pub fn new(inner: S, rejected_table: &str) -> Self {
        Self {
            inner,
            rejected_table: rejected_table.to_string(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RowSink> RowSink for RejectingSink<S> {
    async fn insert_row(&self, row_index: usize, row: &RowPayload) -> Result<()> {
        if row.table == self.rejected_table {
            return Err(TableFillError::Other(format!(
                "row {} of {} violates a NOT NULL constraint",
                row_index, row.table
            )));
        }
        self.inner.insert_row(row_index, row).await
    }

    async fn sample_value(&self, table: &str, column: &str) -> Result<Option<Value>> {
        self.inner.sample_value(table, column).await
    }
}

/// customers ← orders, one foreign key.
pub fn customers_orders() -> StaticMetadata {
    StaticMetadata::new(
        vec![
            ColumnRow::new("public", "customers", "id", "bigint"),
            ColumnRow::new("public", "customers", "name", "text"),
            ColumnRow::new("public", "customers", "email", "text"),
            ColumnRow::new("public", "orders", "id", "bigint"),
            ColumnRow::new("public", "orders", "customer_id", "bigint"),
            ColumnRow::new("public", "orders", "amount", "integer"),
        ],
        vec![ForeignKeyRow::new(
            "orders_customer_id_fkey",
            ("public", "orders", "customer_id"),
            ("public", "customers", "id"),
        )],
    )
}

/// A small shop: users, categories, products, orders with an `order_status`
/// enum, and order items referencing both orders and products.
///
/// Child tables are listed before their parents so that discovery order and
/// fill order differ.
pub fn ecommerce() -> (StaticMetadata, StaticEnumCatalog) {
    let metadata = StaticMetadata::new(
        vec![
            ColumnRow::new("public", "order_items", "id", "bigint"),
            ColumnRow::new("public", "order_items", "order_id", "bigint"),
            ColumnRow::new("public", "order_items", "product_id", "bigint"),
            ColumnRow::new("public", "order_items", "quantity", "integer"),
            ColumnRow::new("public", "orders", "id", "bigint"),
            ColumnRow::new("public", "orders", "user_id", "bigint"),
            ColumnRow::new("public", "orders", "status", "order_status"),
            ColumnRow::new("public", "orders", "placed_at", "timestamp without time zone"),
            ColumnRow::new("public", "orders", "metadata", "jsonb"),
            ColumnRow::new("public", "products", "id", "bigint"),
            ColumnRow::new("public", "products", "category_id", "bigint"),
            ColumnRow::new("public", "products", "name", "text"),
            ColumnRow::new("public", "products", "price", "double precision"),
            ColumnRow::new("public", "products", "in_stock", "boolean"),
            ColumnRow::new("public", "categories", "id", "bigint"),
            ColumnRow::new("public", "categories", "name", "text"),
            ColumnRow::new("public", "users", "id", "bigint"),
            ColumnRow::new("public", "users", "first_name", "text"),
            ColumnRow::new("public", "users", "last_name", "text"),
            ColumnRow::new("public", "users", "email", "text"),
            ColumnRow::new("public", "users", "phone_number", "text"),
        ],
        vec![
            ForeignKeyRow::new(
                "order_items_order_id_fkey",
                ("public", "order_items", "order_id"),
                ("public", "orders", "id"),
            ),
            ForeignKeyRow::new(
                "order_items_product_id_fkey",
                ("public", "order_items", "product_id"),
                ("public", "products", "id"),
            ),
            ForeignKeyRow::new(
                "orders_user_id_fkey",
                ("public", "orders", "user_id"),
                ("public", "users", "id"),
            ),
            ForeignKeyRow::new(
                "products_category_id_fkey",
                ("public", "products", "category_id"),
                ("public", "categories", "id"),
            ),
        ],
    );
    let enums = StaticEnumCatalog::new().with_enum(
        "order_status",
        &["pending", "paid", "shipped", "cancelled"],
    );
    (metadata, enums)
}

/// accounts ← users, accounts ← projects, users ← memberships,
/// projects ← memberships.
pub fn diamond() -> StaticMetadata {
    StaticMetadata::new(
        vec![
            ColumnRow::new("public", "memberships", "id", "bigint"),
            ColumnRow::new("public", "memberships", "user_id", "bigint"),
            ColumnRow::new("public", "memberships", "project_id", "bigint"),
            ColumnRow::new("public", "users", "id", "bigint"),
            ColumnRow::new("public", "users", "account_id", "bigint"),
            ColumnRow::new("public", "projects", "id", "bigint"),
            ColumnRow::new("public", "projects", "account_id", "bigint"),
            ColumnRow::new("public", "accounts", "id", "bigint"),
            ColumnRow::new("public", "accounts", "name", "text"),
        ],
        vec![
            ForeignKeyRow::new(
                "memberships_user_id_fkey",
                ("public", "memberships", "user_id"),
                ("public", "users", "id"),
            ),
            ForeignKeyRow::new(
                "memberships_project_id_fkey",
                ("public", "memberships", "project_id"),
                ("public", "projects", "id"),
            ),
            ForeignKeyRow::new(
                "users_account_id_fkey",
                ("public", "users", "account_id"),
                ("public", "accounts", "id"),
            ),
            ForeignKeyRow::new(
                "projects_account_id_fkey",
                ("public", "projects", "account_id"),
                ("public", "accounts", "id"),
            ),
        ],
    )
}

/// employees.team_id → teams, teams.lead_id → employees.
pub fn employees_teams_cycle() -> StaticMetadata {
    StaticMetadata::new(
        vec![
            ColumnRow::new("public", "employees", "id", "bigint"),
            ColumnRow::new("public", "employees", "team_id", "bigint"),
            ColumnRow::new("public", "teams", "id", "bigint"),
            ColumnRow::new("public", "teams", "lead_id", "bigint"),
        ],
        vec![
            ForeignKeyRow::new(
                "employees_team_id_fkey",
                ("public", "employees", "team_id"),
                ("public", "teams", "id"),
            ),
            ForeignKeyRow::new(
                "teams_lead_id_fkey",
                ("public", "teams", "lead_id"),
                ("public", "employees", "id"),
            ),
        ],
    )
}
