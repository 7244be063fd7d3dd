pub mod dag;
pub mod order;
pub mod visualize;
