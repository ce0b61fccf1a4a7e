//! Query and aggregation intents
//!
//! An intent says what the caller wants to ask of the search service without
//! committing to a wire format. [`QueryBuilder`](crate::QueryBuilder) and
//! [`AggregationBuilder`](crate::AggregationBuilder) turn intents into Query
//! DSL bodies and reject invalid parameters before anything is sent.

use crate::error::SiftError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A single query clause
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent {
    /// Exact (not analyzed) match of `field` against `value`
    Term { field: String, value: Value },

    /// Inclusive bounds on `field`; at least one bound is required
    Range {
        field: String,
        gte: Option<Value>,
        lte: Option<Value>,
    },

    /// Match tolerating up to `fuzziness` edits
    Fuzzy {
        field: String,
        value: String,
        fuzziness: i64,
    },

    /// Analyzed full-text match
    Match { field: String, query: String },

    /// Phrase match allowing `slop` positions between the words
    MatchPhraseSlop {
        field: String,
        query: String,
        slop: i64,
    },

    /// Raw query-string expression, forwarded verbatim
    QueryString { default_field: String, query: String },

    /// Compound query
    Boolean(BoolIntent),
}

impl QueryIntent {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, gte: Option<Value>, lte: Option<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gte,
            lte,
        }
    }

    pub fn fuzzy(field: impl Into<String>, value: impl Into<String>, fuzziness: i64) -> Self {
        Self::Fuzzy {
            field: field.into(),
            value: value.into(),
            fuzziness,
        }
    }

    pub fn matching(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    pub fn phrase(field: impl Into<String>, query: impl Into<String>, slop: i64) -> Self {
        Self::MatchPhraseSlop {
            field: field.into(),
            query: query.into(),
            slop,
        }
    }

    pub fn query_string(default_field: impl Into<String>, query: impl Into<String>) -> Self {
        Self::QueryString {
            default_field: default_field.into(),
            query: query.into(),
        }
    }

    /// Query DSL key this intent serializes under
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Term { .. } => "term",
            Self::Range { .. } => "range",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Match { .. } => "match",
            Self::MatchPhraseSlop { .. } => "match_phrase",
            Self::QueryString { .. } => "query_string",
            Self::Boolean(_) => "bool",
        }
    }
}

impl From<BoolIntent> for QueryIntent {
    fn from(b: BoolIntent) -> Self {
        Self::Boolean(b)
    }
}

/// Sub-clauses of a boolean query.
///
/// Each list keeps insertion order. A list holding exactly one clause is sent
/// as a single object, longer lists as arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolIntent {
    pub must: Vec<QueryIntent>,
    pub must_not: Vec<QueryIntent>,
    pub filter: Vec<QueryIntent>,
}

impl BoolIntent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, clause: QueryIntent) -> Self {
        self.must.push(clause);
        self
    }

    pub fn must_not(mut self, clause: QueryIntent) -> Self {
        self.must_not.push(clause);
        self
    }

    pub fn filter(mut self, clause: QueryIntent) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.filter.is_empty()
    }
}

/// Reject empty field names; `context` names the clause in the message
pub(crate) fn require_field<'a>(field: &'a str, context: &str) -> crate::Result<&'a str> {
    if field.trim().is_empty() {
        Err(SiftError::InvalidParameter(format!(
            "{} field name must not be empty",
            context
        )))
    } else {
        Ok(field)
    }
}

/// Single-field metric aggregations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Avg,
    Min,
    Max,
    Sum,
    Stats,
    ExtendedStats,
    Percentiles,
    ValueCount,
    Cardinality,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        Self::Avg,
        Self::Min,
        Self::Max,
        Self::Sum,
        Self::Stats,
        Self::ExtendedStats,
        Self::Percentiles,
        Self::ValueCount,
        Self::Cardinality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Stats => "stats",
            Self::ExtendedStats => "extended_stats",
            Self::Percentiles => "percentiles",
            Self::ValueCount => "value_count",
            Self::Cardinality => "cardinality",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                SiftError::InvalidParameter(format!(
                    "unknown metric '{}', expected one of: {}",
                    s,
                    Self::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

/// How a pipeline aggregation treats buckets with no data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    #[default]
    Skip,
    InsertZeros,
    KeepValues,
}

impl GapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::InsertZeros => "insert_zeros",
            Self::KeepValues => "keep_values",
        }
    }
}

impl FromStr for GapPolicy {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "insert_zeros" => Ok(Self::InsertZeros),
            "keep_values" => Ok(Self::KeepValues),
            other => Err(SiftError::InvalidParameter(format!(
                "unknown gap policy '{}'",
                other
            ))),
        }
    }
}

/// Moving average over a date histogram.
///
/// Produces a `date_histogram` on `field`, a `value_count` metric named
/// `count_name` inside each bucket, and a `moving_fn` pipeline reading that
/// metric. The window arithmetic runs remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageSpec {
    pub field: String,
    pub interval: String,
    pub count_name: String,
    pub window: usize,
    pub shift: i64,
    pub gap_policy: GapPolicy,
    pub script: String,
}

impl Default for MovingAverageSpec {
    fn default() -> Self {
        Self {
            field: "date".to_string(),
            interval: "year".to_string(),
            count_name: "recipes_count".to_string(),
            window: 3,
            shift: 1,
            gap_policy: GapPolicy::InsertZeros,
            script: "MovingFunctions.unweightedAvg(values)".to_string(),
        }
    }
}

/// An aggregation request
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationIntent {
    Metric { kind: MetricKind, field: String },

    /// Buckets split at `cut_points`, which must be strictly ascending
    Range { field: String, cut_points: Vec<f64> },

    /// One bucket per distinct value, at most `size` buckets
    Terms { field: String, size: Option<usize> },

    /// Values appearing in no more than `max_doc_count` documents
    RareTerms { field: String, max_doc_count: u64 },

    DateHistogram { field: String, interval: String },

    MovingAverage(MovingAverageSpec),
}

impl AggregationIntent {
    pub fn metric(kind: MetricKind, field: impl Into<String>) -> Self {
        Self::Metric {
            kind,
            field: field.into(),
        }
    }

    pub fn range(field: impl Into<String>, cut_points: impl Into<Vec<f64>>) -> Self {
        Self::Range {
            field: field.into(),
            cut_points: cut_points.into(),
        }
    }

    pub fn terms(field: impl Into<String>, size: Option<usize>) -> Self {
        Self::Terms {
            field: field.into(),
            size,
        }
    }

    pub fn rare_terms(field: impl Into<String>, max_doc_count: u64) -> Self {
        Self::RareTerms {
            field: field.into(),
            max_doc_count,
        }
    }

    pub fn date_histogram(field: impl Into<String>, interval: impl Into<String>) -> Self {
        Self::DateHistogram {
            field: field.into(),
            interval: interval.into(),
        }
    }

    /// Name used when the caller does not pick one
    pub fn default_name(&self) -> String {
        match self {
            Self::Metric { field, .. } => format!("aggs-for-{}", field),
            Self::Range { field, .. } => format!("range-aggs-for-{}", field),
            Self::Terms { field, .. } => format!("terms-aggs-for-{}", field),
            Self::RareTerms { field, .. } => format!("rare-terms-aggs-for-{}", field),
            Self::DateHistogram { field, .. } => format!("histogram-for-{}", field),
            Self::MovingAverage(_) => "recipes_per_year".to_string(),
        }
    }

    pub fn named(self, name: impl Into<String>) -> NamedAggregation {
        NamedAggregation {
            name: name.into(),
            intent: self,
        }
    }
}

impl From<AggregationIntent> for NamedAggregation {
    fn from(intent: AggregationIntent) -> Self {
        let name = intent.default_name();
        intent.named(name)
    }
}

/// An aggregation under the key it will appear with in the response
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAggregation {
    pub name: String,
    pub intent: AggregationIntent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("sodium", "query").unwrap(), "sodium");
        let err = require_field(" ", "aggregation").unwrap_err();
        assert!(matches!(err, SiftError::InvalidParameter(ref m) if m.starts_with("aggregation field")));
    }

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("avg".parse::<MetricKind>().unwrap(), MetricKind::Avg);
        assert_eq!(
            "extended_stats".parse::<MetricKind>().unwrap(),
            MetricKind::ExtendedStats
        );
        let err = "median".parse::<MetricKind>().unwrap_err();
        assert!(matches!(err, SiftError::InvalidParameter(_)));
        assert!(err.to_string().contains("value_count"));
    }

    #[test]
    fn test_metric_kind_round_trips_through_display() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.to_string().parse::<MetricKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_gap_policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(GapPolicy::InsertZeros).unwrap(),
            json!("insert_zeros")
        );
        assert_eq!("keep_values".parse::<GapPolicy>().unwrap(), GapPolicy::KeepValues);
        assert!("zeros".parse::<GapPolicy>().is_err());
    }

    #[test]
    fn test_default_names() {
        assert_eq!(
            AggregationIntent::metric(MetricKind::Avg, "rating").default_name(),
            "aggs-for-rating"
        );
        assert_eq!(
            AggregationIntent::range("sodium", vec![500.0]).default_name(),
            "range-aggs-for-sodium"
        );
        assert_eq!(
            AggregationIntent::terms("categories.keyword", Some(20)).default_name(),
            "terms-aggs-for-categories.keyword"
        );
        assert_eq!(
            AggregationIntent::rare_terms("categories.keyword", 3).default_name(),
            "rare-terms-aggs-for-categories.keyword"
        );
        assert_eq!(
            AggregationIntent::date_histogram("date", "year").default_name(),
            "histogram-for-date"
        );
        let named: NamedAggregation =
            AggregationIntent::MovingAverage(MovingAverageSpec::default()).into();
        assert_eq!(named.name, "recipes_per_year");
    }

    #[test]
    fn test_bool_intent_keeps_clause_order() {
        let b = BoolIntent::new()
            .filter(QueryIntent::range("sodium", None, Some(json!(50))))
            .filter(QueryIntent::range("protein", Some(json!(5)), None));
        assert_eq!(b.filter.len(), 2);
        assert!(matches!(&b.filter[0], QueryIntent::Range { field, .. } if field == "sodium"));
        assert!(!b.is_empty());
        assert!(BoolIntent::new().is_empty());
    }

    #[test]
    fn test_intent_kind() {
        assert_eq!(QueryIntent::term("sodium", 0).kind(), "term");
        assert_eq!(QueryIntent::phrase("directions", "pizza pineapple", 10).kind(), "match_phrase");
        assert_eq!(QueryIntent::from(BoolIntent::new()).kind(), "bool");
    }
}
