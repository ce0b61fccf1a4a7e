//! Response envelope and the normalizer that projects it

use crate::error::SiftError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Response envelope returned by a search call.
///
/// The envelope stays opaque; use [`ResponseNormalizer`] to read titles,
/// aggregations or buckets out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    envelope: Value,
}

impl SearchResponse {
    pub fn from_json(envelope: Value) -> Self {
        Self { envelope }
    }

    /// Server-side execution time in milliseconds
    pub fn took(&self) -> Option<u64> {
        self.envelope.get("took").and_then(Value::as_u64)
    }

    pub fn timed_out(&self) -> bool {
        self.envelope
            .get("timed_out")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Total matching documents (`hits.total.value`, or a bare number from
    /// older servers)
    pub fn total_hits(&self) -> Option<u64> {
        let total = self.envelope.get("hits")?.get("total")?;
        total
            .get("value")
            .and_then(Value::as_u64)
            .or_else(|| total.as_u64())
    }

    fn hits(&self) -> Result<&Vec<Value>> {
        self.envelope
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SiftError::MalformedResponse("response has no hits.hits array".to_string())
            })
    }

    fn aggregation(&self, name: &str) -> Option<&Value> {
        self.envelope.get("aggregations")?.get(name)
    }
}

/// A bucket produced by a bucket aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub key: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    /// Sub-aggregation payloads and any other per-bucket fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Bucket {
    /// Named sub-aggregation payload of this bucket
    pub fn sub_aggregation(&self, name: &str) -> Option<AggregationResult> {
        self.extra
            .get(name)
            .filter(|v| v.is_object())
            .map(|v| AggregationResult::new(name, v.clone()))
    }

    /// Date-histogram keys are epoch milliseconds
    pub fn key_as_datetime(&self) -> Option<DateTime<Utc>> {
        self.key.as_i64().and_then(DateTime::from_timestamp_millis)
    }

    /// Human-readable key: `key_as_string` when present, else the raw key
    pub fn label(&self) -> String {
        match (&self.key_as_string, &self.key) {
            (Some(s), _) => s.clone(),
            (None, Value::String(s)) => s.clone(),
            (None, other) => other.to_string(),
        }
    }
}

/// Summary statistics returned by `stats` / `extended_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub sum: Option<f64>,
}

/// A named aggregation payload, exactly as the service returned it
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    name: String,
    payload: Value,
}

impl AggregationResult {
    fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Single-value metric result (`avg`, `min`, `value_count`, ...)
    pub fn value(&self) -> Option<f64> {
        self.payload.get("value").and_then(Value::as_f64)
    }

    pub fn stats(&self) -> Option<Stats> {
        self.payload.get("count")?;
        serde_json::from_value(self.payload.clone()).ok()
    }

    pub fn buckets(&self) -> Result<Vec<Bucket>> {
        parse_buckets(&self.name, &self.payload)
    }
}

/// Projections of a [`SearchResponse`]. Pure: nothing is logged here.
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// `_source.title` of every hit, in hit order
    pub fn extract_titles(response: &SearchResponse) -> Result<Vec<String>> {
        response
            .hits()?
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                hit.get("_source")
                    .and_then(|s| s.get("title"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SiftError::MalformedResponse(format!(
                            "hit {} has no string _source.title",
                            i
                        ))
                    })
            })
            .collect()
    }

    /// `_source` of every hit, in hit order
    pub fn extract_sources(response: &SearchResponse) -> Result<Vec<Value>> {
        response
            .hits()?
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                hit.get("_source").cloned().ok_or_else(|| {
                    SiftError::MalformedResponse(format!("hit {} has no _source", i))
                })
            })
            .collect()
    }

    /// The aggregation stored under `name`, unmodified
    pub fn extract_aggregation(response: &SearchResponse, name: &str) -> Result<AggregationResult> {
        response
            .aggregation(name)
            .map(|payload| AggregationResult::new(name, payload.clone()))
            .ok_or_else(|| SiftError::AggregationNotFound(name.to_string()))
    }

    /// The `buckets` list of the aggregation stored under `name`
    pub fn extract_buckets(response: &SearchResponse, name: &str) -> Result<Vec<Bucket>> {
        let payload = response
            .aggregation(name)
            .ok_or_else(|| SiftError::AggregationNotFound(name.to_string()))?;
        parse_buckets(name, payload)
    }
}

fn parse_buckets(name: &str, payload: &Value) -> Result<Vec<Bucket>> {
    let malformed = |detail: String| {
        SiftError::MalformedResponse(format!("aggregation '{}': {}", name, detail))
    };

    match payload.get("buckets") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|b| serde_json::from_value(b.clone()).map_err(|e| malformed(e.to_string())))
            .collect(),
        // `keyed: true` responses map key -> bucket, in service order
        Some(Value::Object(items)) => items
            .iter()
            .map(|(key, b)| {
                let mut bucket: Bucket =
                    serde_json::from_value(b.clone()).map_err(|e| malformed(e.to_string()))?;
                if bucket.key.is_null() {
                    bucket.key = Value::String(key.clone());
                }
                Ok(bucket)
            })
            .collect(),
        _ => Err(malformed("no buckets list".to_string())),
    }
}

/// Error body returned by the service on failure
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsErrorEnvelope {
    pub error: EsErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum EsErrorDetail {
    Structured(EsError),
    Message(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl EsErrorDetail {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Structured(EsError {
                error_type,
                reason: Some(reason),
            }) => format!("{}: {}", error_type, reason),
            Self::Structured(EsError { error_type, .. }) => error_type.clone(),
            Self::Message(m) => m.clone(),
        }
    }
}

/// A row of `_cat/indices?format=json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatIndex {
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub index: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub pri: Option<String>,
    #[serde(default)]
    pub rep: Option<String>,
    #[serde(default, rename = "docs.count")]
    pub docs_count: Option<String>,
    #[serde(default, rename = "docs.deleted")]
    pub docs_deleted: Option<String>,
    #[serde(default, rename = "store.size")]
    pub store_size: Option<String>,
    #[serde(default, rename = "pri.store.size")]
    pub pri_store_size: Option<String>,
}
