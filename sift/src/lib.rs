//! Typed client for Elasticsearch-compatible search services
//!
//! This crate builds Query DSL request bodies from a closed set of typed
//! intents, submits them over HTTP, and projects the response envelope into
//! the shapes callers actually want (document titles, a named aggregation,
//! or a bucket list). All matching, scoring and aggregation work happens in
//! the remote service.
//!
//! # Query intents
//!
//! - `term` - exact match
//! - `range` - `gte` / `lte` bounds
//! - `fuzzy` - edit-distance match
//! - `match` / `match_phrase` (with slop)
//! - `query_string` - passed through verbatim
//! - `bool` (must, must_not, filter)
//!
//! # Aggregation intents
//!
//! - metrics: `avg` / `min` / `max` / `sum` / `stats` / `extended_stats` /
//!   `percentiles` / `value_count` / `cardinality`
//! - `range` from a flat list of cut points
//! - `terms` / `rare_terms`
//! - `date_histogram`
//! - moving average (`date_histogram` + `value_count` + `moving_fn`)
//!
//! # Example
//!
//! ```no_run
//! use sift::{QueryIntent, SearchClient, SearchRequest, SiftConfig, ResponseNormalizer};
//!
//! # async fn run() -> sift::Result<()> {
//! let client = SearchClient::new(SiftConfig::default())?;
//! let request = SearchRequest::new("recipes")
//!     .with_query(QueryIntent::term("sodium", 0));
//! let response = client.execute(&request).await?;
//! for title in ResponseNormalizer::extract_titles(&response)? {
//!     println!("{title}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod client;
pub mod config;
pub mod error;
pub mod intent;
pub mod query;
pub mod request;
pub mod response;

pub use aggregation::AggregationBuilder;
pub use client::{BulkSummary, SearchClient};
pub use config::{AuthConfig, LoggingConfig, SiftConfig};
pub use error::{ServiceError, SiftError};
pub use intent::{
    AggregationIntent, BoolIntent, GapPolicy, MetricKind, MovingAverageSpec, NamedAggregation,
    QueryIntent,
};
pub use query::QueryBuilder;
pub use request::SearchRequest;
pub use response::{
    AggregationResult, Bucket, CatIndex, ResponseNormalizer, SearchResponse, Stats,
};

/// Result type for sift operations
pub type Result<T> = std::result::Result<T, SiftError>;
