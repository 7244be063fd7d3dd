pub mod enum_cache;
pub mod providers;
pub mod row;
pub mod synthesizer;
pub mod value;
