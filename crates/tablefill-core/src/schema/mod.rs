pub mod introspect;
pub mod postgres;
pub mod types;
