//! Builds aggregation bodies from aggregation intents

use crate::aggregation::types::*;
use crate::error::SiftError;
use crate::intent::{
    require_field, AggregationIntent, MetricKind, MovingAverageSpec, NamedAggregation,
};
use crate::Result;
use std::collections::HashMap;

/// Interval names the service treats as calendar-aware
const CALENDAR_INTERVALS: &[&str] = &[
    "minute", "hour", "day", "week", "month", "quarter", "year", "1m", "1h", "1d", "1w", "1M",
    "1q", "1y",
];

/// Name of the pipeline aggregation inside a moving-average histogram
pub const MOVING_AVERAGE_NAME: &str = "moving_average";

/// Translates [`AggregationIntent`]s into aggregation bodies
pub struct AggregationBuilder;

impl AggregationBuilder {
    /// Build the `aggs` map for a request, rejecting duplicate names
    pub fn build_all(aggs: &[NamedAggregation]) -> Result<HashMap<String, EsAggregation>> {
        let mut built = HashMap::with_capacity(aggs.len());
        for named in aggs {
            if named.name.trim().is_empty() {
                return Err(SiftError::InvalidParameter(
                    "aggregation name must not be empty".to_string(),
                ));
            }
            let agg = Self::build(&named.intent)?;
            if built.insert(named.name.clone(), agg).is_some() {
                return Err(SiftError::InvalidParameter(format!(
                    "duplicate aggregation name '{}'",
                    named.name
                )));
            }
        }
        Ok(built)
    }

    /// Build a single aggregation body
    pub fn build(intent: &AggregationIntent) -> Result<EsAggregation> {
        match intent {
            AggregationIntent::Metric { kind, field } => {
                Ok(Self::metric(*kind, require_field(field, "aggregation")?))
            }

            AggregationIntent::Range { field, cut_points } => Ok(EsAggregation {
                range: Some(RangeAgg {
                    field: require_field(field, "aggregation")?.to_string(),
                    ranges: Self::range_buckets(cut_points)?,
                }),
                ..Default::default()
            }),

            AggregationIntent::Terms { field, size } => {
                if *size == Some(0) {
                    return Err(SiftError::InvalidParameter(
                        "terms size must be at least 1".to_string(),
                    ));
                }
                Ok(EsAggregation {
                    terms: Some(TermsAgg {
                        field: require_field(field, "aggregation")?.to_string(),
                        size: *size,
                    }),
                    ..Default::default()
                })
            }

            AggregationIntent::RareTerms {
                field,
                max_doc_count,
            } => {
                if *max_doc_count == 0 {
                    return Err(SiftError::InvalidParameter(
                        "rare_terms max_doc_count must be at least 1".to_string(),
                    ));
                }
                Ok(EsAggregation {
                    rare_terms: Some(RareTermsAgg {
                        field: require_field(field, "aggregation")?.to_string(),
                        max_doc_count: *max_doc_count,
                    }),
                    ..Default::default()
                })
            }

            AggregationIntent::DateHistogram { field, interval } => Ok(EsAggregation {
                date_histogram: Some(Self::date_histogram(field, interval)?),
                ..Default::default()
            }),

            AggregationIntent::MovingAverage(spec) => Self::moving_average(spec),
        }
    }

    /// Expand N ascending cut points into N+1 contiguous buckets:
    /// `[{to: c0}, {from: c0, to: c1}, ..., {from: cN-1}]`.
    ///
    /// With no cut points the single bucket is unbounded on both sides.
    pub fn range_buckets(cut_points: &[f64]) -> Result<Vec<RangeBucket>> {
        if let Some(bad) = cut_points.iter().find(|c| !c.is_finite()) {
            return Err(SiftError::InvalidParameter(format!(
                "range cut point {} is not a finite number",
                bad
            )));
        }
        if let Some(pair) = cut_points.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SiftError::InvalidParameter(format!(
                "range cut points must be strictly ascending ({} then {})",
                pair[0], pair[1]
            )));
        }

        let mut ranges = Vec::with_capacity(cut_points.len() + 1);
        let mut from = None;
        for &to in cut_points {
            ranges.push(RangeBucket {
                key: None,
                from,
                to: Some(to),
            });
            from = Some(to);
        }
        ranges.push(RangeBucket {
            key: None,
            from,
            to: None,
        });
        Ok(ranges)
    }

    fn metric(kind: MetricKind, field: &str) -> EsAggregation {
        let body = Some(FieldAgg {
            field: field.to_string(),
        });
        let mut agg = EsAggregation::default();
        match kind {
            MetricKind::Avg => agg.avg = body,
            MetricKind::Min => agg.min = body,
            MetricKind::Max => agg.max = body,
            MetricKind::Sum => agg.sum = body,
            MetricKind::Stats => agg.stats = body,
            MetricKind::ExtendedStats => agg.extended_stats = body,
            MetricKind::Percentiles => agg.percentiles = body,
            MetricKind::ValueCount => agg.value_count = body,
            MetricKind::Cardinality => agg.cardinality = body,
        }
        agg
    }

    fn date_histogram(field: &str, interval: &str) -> Result<DateHistogramAgg> {
        let field = require_field(field, "aggregation")?.to_string();
        let interval = interval.trim();
        if interval.is_empty() {
            return Err(SiftError::InvalidParameter(
                "date_histogram interval must not be empty".to_string(),
            ));
        }
        if CALENDAR_INTERVALS.contains(&interval) {
            Ok(DateHistogramAgg {
                field,
                calendar_interval: Some(interval.to_string()),
                fixed_interval: None,
            })
        } else {
            Ok(DateHistogramAgg {
                field,
                calendar_interval: None,
                fixed_interval: Some(interval.to_string()),
            })
        }
    }

    fn moving_average(spec: &MovingAverageSpec) -> Result<EsAggregation> {
        if spec.window == 0 {
            return Err(SiftError::InvalidParameter(
                "moving average window must be at least 1".to_string(),
            ));
        }
        if spec.count_name.trim().is_empty() || spec.count_name == MOVING_AVERAGE_NAME {
            return Err(SiftError::InvalidParameter(format!(
                "invalid count aggregation name '{}'",
                spec.count_name
            )));
        }

        let field = require_field(&spec.field, "moving average")?;
        let count = Self::metric(MetricKind::ValueCount, field);
        let moving = EsAggregation {
            moving_fn: Some(MovingFnAgg {
                buckets_path: spec.count_name.clone(),
                window: spec.window,
                script: spec.script.clone(),
                shift: spec.shift,
                gap_policy: spec.gap_policy,
            }),
            ..Default::default()
        };

        Ok(EsAggregation {
            date_histogram: Some(Self::date_histogram(&spec.field, &spec.interval)?),
            aggs: Some(HashMap::from([
                (spec.count_name.clone(), count),
                (MOVING_AVERAGE_NAME.to_string(), moving),
            ])),
            ..Default::default()
        })
    }
}
