pub mod config;
pub mod error;
pub mod fill;
pub mod generate;
pub mod graph;
pub mod schema;
pub mod sink;

// Re-export key types for convenience
pub use error::{Result, TableFillError};
pub use fill::{run_fill, FillOptions, FillReport, FillRun};
pub use graph::dag::SchemaGraph;
pub use graph::order::{plan_fill_order, FillOrder};
