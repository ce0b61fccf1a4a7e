//! Elasticsearch aggregation types

use crate::intent::GapPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the `aggs` map.
///
/// Exactly one aggregation field is set by the builder; `aggs` carries
/// sub-aggregations for bucket aggregations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EsAggregation {
    // Metric aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_stats: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_count: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<FieldAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<FieldAgg>,

    // Bucket aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermsAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rare_terms: Option<RareTermsAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_histogram: Option<DateHistogramAgg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeAgg>,

    // Pipeline aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving_fn: Option<MovingFnAgg>,

    // Nested aggregations
    #[serde(default, alias = "aggregations", skip_serializing_if = "Option::is_none")]
    pub aggs: Option<HashMap<String, EsAggregation>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldAgg {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TermsAgg {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RareTermsAgg {
    pub field: String,
    pub max_doc_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DateHistogramAgg {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeAgg {
    pub field: String,
    pub ranges: Vec<RangeBucket>,
}

/// Half-open `[from, to)` interval; a missing side is unbounded
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RangeBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MovingFnAgg {
    pub buckets_path: String,
    pub window: usize,
    pub script: String,
    #[serde(default)]
    pub shift: i64,
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_set_fields_are_serialized() {
        let agg = EsAggregation {
            avg: Some(FieldAgg {
                field: "rating".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&agg).unwrap(),
            json!({"avg": {"field": "rating"}})
        );
    }

    #[test]
    fn test_deserialize_range_agg() {
        let agg: EsAggregation = serde_json::from_value(json!({
            "range": {
                "field": "sodium",
                "ranges": [
                    {"to": 500.0},
                    {"from": 500.0, "to": 1000.0},
                    {"from": 1000.0}
                ]
            }
        }))
        .unwrap();
        let r = agg.range.unwrap();
        assert_eq!(r.field, "sodium");
        assert_eq!(r.ranges.len(), 3);
        assert_eq!(r.ranges[0].from, None);
        assert_eq!(r.ranges[2].to, None);
    }

    #[test]
    fn test_deserialize_moving_fn_defaults() {
        let agg: EsAggregation = serde_json::from_value(json!({
            "moving_fn": {
                "buckets_path": "recipes_count",
                "window": 3,
                "script": "MovingFunctions.unweightedAvg(values)"
            }
        }))
        .unwrap();
        let m = agg.moving_fn.unwrap();
        assert_eq!(m.shift, 0);
        assert_eq!(m.gap_policy, GapPolicy::Skip);
    }
}
