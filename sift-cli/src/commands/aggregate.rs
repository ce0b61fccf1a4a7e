use super::print_json;
use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;
use sift::{
    AggregationIntent, MetricKind, MovingAverageSpec, NamedAggregation, ResponseNormalizer,
    SearchClient, SearchRequest,
};

#[derive(Subcommand, Debug)]
pub enum AggregateCommand {
    /// Average recipe rating
    AverageRating,

    /// Single metric over a field, e.g. `metric avg rating`; `terms` is
    /// also accepted and groups by value
    Metric {
        #[arg(value_parser = parse_metric)]
        kind: MetricArg,
        field: String,
    },

    /// Recipes grouped into low / medium / high sodium
    SodiumRange,

    /// Buckets split at the given cut points, e.g. `range sodium 500 1000`
    Range {
        field: String,
        #[arg(allow_negative_numbers = true)]
        cut_points: Vec<f64>,
    },

    /// One bucket per distinct value, e.g. `terms categories.keyword 20`
    Terms { field: String, size: Option<usize> },

    /// Least frequent values, e.g. `rare-terms categories.keyword 3`
    RareTerms { field: String, max_doc_count: u64 },

    /// Buckets per time interval, e.g. `date-histogram date year`
    DateHistogram { field: String, interval: String },

    /// Moving average of recipes added per year
    MovingAverage {
        #[arg(long, default_value_t = 3)]
        window: usize,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        shift: i64,
    },
}

/// Argument of `aggregate metric`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricArg {
    Metric(MetricKind),
    Terms,
}

fn parse_metric(raw: &str) -> Result<MetricArg, String> {
    if raw == "terms" {
        return Ok(MetricArg::Terms);
    }
    raw.parse::<MetricKind>()
        .map(MetricArg::Metric)
        .map_err(|e| format!("{} (or terms)", e))
}

impl AggregateCommand {
    fn into_aggregation(self) -> NamedAggregation {
        match self {
            Self::AverageRating => {
                AggregationIntent::metric(MetricKind::Avg, "rating").named("average-rating")
            }
            Self::Metric { kind, field } => {
                let name = format!("aggs-for-{}", field);
                match kind {
                    MetricArg::Metric(kind) => AggregationIntent::metric(kind, field).named(name),
                    MetricArg::Terms => AggregationIntent::terms(field, None).named(name),
                }
            }
            Self::SodiumRange => {
                AggregationIntent::range("sodium", vec![500.0, 1000.0]).named("sodium-ranges")
            }
            Self::Range { field, cut_points } => {
                AggregationIntent::range(field, cut_points).into()
            }
            Self::Terms { field, size } => AggregationIntent::terms(field, size).into(),
            Self::RareTerms {
                field,
                max_doc_count,
            } => AggregationIntent::rare_terms(field, max_doc_count).into(),
            Self::DateHistogram { field, interval } => {
                AggregationIntent::date_histogram(field, interval).into()
            }
            Self::MovingAverage { window, shift } => {
                AggregationIntent::MovingAverage(MovingAverageSpec {
                    window,
                    shift,
                    ..Default::default()
                })
                .into()
            }
        }
    }
}

pub async fn run(client: &SearchClient, command: AggregateCommand, json: bool) -> Result<()> {
    let buckets_only = matches!(command, AggregateCommand::MovingAverage { .. });
    let aggregation = command.into_aggregation();
    let name = aggregation.name.clone();

    let request = SearchRequest::new(client.index()).with_aggregation(aggregation);
    let response = client.execute(&request).await?;

    if buckets_only {
        let buckets = ResponseNormalizer::extract_buckets(&response, &name)?;
        if json {
            return print_json(&serde_json::to_value(&buckets)?);
        }
        for bucket in buckets {
            let average = bucket
                .sub_aggregation(sift::aggregation::MOVING_AVERAGE_NAME)
                .and_then(|a| a.value());
            match average {
                Some(avg) => println!("{:<28} {:>8} {:>10.2}", bucket.label(), bucket.doc_count, avg),
                None => println!("{:<28} {:>8} {:>10}", bucket.label(), bucket.doc_count, "-"),
            }
        }
        return Ok(());
    }

    let result = ResponseNormalizer::extract_aggregation(&response, &name)?;
    if json {
        return print_json(result.payload());
    }

    println!("{}", name);
    match result.buckets() {
        Ok(buckets) => {
            for bucket in buckets {
                println!("  {:<40} {:>8}", bucket.label(), bucket.doc_count);
            }
        }
        Err(_) => print_metric(result.payload())?,
    }
    Ok(())
}

fn print_metric(payload: &Value) -> Result<()> {
    match payload.as_object() {
        Some(fields) => {
            for (key, value) in fields {
                println!("  {:<24} {}", key, value);
            }
            Ok(())
        }
        None => print_json(payload),
    }
}
