//! Aggregation request bodies and the builder that produces them

pub mod builder;
pub mod types;

pub use builder::{AggregationBuilder, MOVING_AVERAGE_NAME};
pub use types::*;
