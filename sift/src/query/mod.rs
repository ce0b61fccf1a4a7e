//! Query DSL request bodies and the builder that produces them

pub mod builder;
pub mod types;

pub use builder::QueryBuilder;
pub use types::*;
