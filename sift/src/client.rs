//! HTTP client for an Elasticsearch-compatible search service
//!
//! The only module that performs I/O. Every failure is classified into a
//! [`ServiceError`] before it reaches the caller; nothing is retried.

use crate::config::{AuthConfig, SiftConfig};
use crate::error::{ServiceError, SiftError};
use crate::request::SearchRequest;
use crate::response::{CatIndex, EsErrorEnvelope, SearchResponse};
use crate::Result;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a bulk ingest call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub took: u64,
    pub errors: bool,
    pub items: usize,
    pub failed: usize,
}

/// Search service client.
///
/// Holds one pooled `reqwest::Client`; clones share the pool.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    config: SiftConfig,
    base: Url,
}

impl SearchClient {
    pub fn new(config: SiftConfig) -> Result<Self> {
        config.validate()?;
        let base = config.endpoint_url()?;

        let mut headers = HeaderMap::new();
        if let Some(AuthConfig::ApiKey { key }) = &config.auth {
            let value = HeaderValue::from_str(&format!("ApiKey {}", key))
                .map_err(|e| SiftError::Config(format!("invalid api key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| SiftError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, base })
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Index targeted by the admin calls
    pub fn index(&self) -> &str {
        &self.config.index
    }

    /// Run one search and return the raw envelope
    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = request.body()?;
        let mut url = self.url(&[request.index(), "_search"])?;
        if let Some(q) = request.uri_query() {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", q);
            if let Some(size) = request.effective_size() {
                pairs.append_pair("size", &size.to_string());
            }
        }

        let payload = serde_json::to_vec(&body)
            .map_err(|e| SiftError::InvalidParameter(format!("unserializable request: {}", e)))?;
        debug!(
            index = request.index(),
            body_bytes = payload.len(),
            aggregations = request.aggregations().len(),
            uri_query = request.uri_query().is_some(),
            "search request"
        );

        let builder = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let envelope = self.send(builder, "search").await?;
        let response = SearchResponse::from_json(envelope);

        debug!(
            index = request.index(),
            took_ms = response.took(),
            total_hits = response.total_hits(),
            "search response"
        );
        Ok(response)
    }

    /// `GET /_cat/indices?format=json`
    pub async fn list_indices(&self) -> Result<Vec<CatIndex>> {
        let mut url = self.url(&["_cat", "indices"])?;
        url.query_pairs_mut().append_pair("format", "json");

        let body = self.send(self.request(Method::GET, url), "cat_indices").await?;
        serde_json::from_value(body)
            .map_err(|e| SiftError::MalformedResponse(format!("cat indices: {}", e)))
    }

    /// Ingest `docs` into the configured index and refresh it
    pub async fn bulk_index(&self, docs: &[Value]) -> Result<BulkSummary> {
        if docs.is_empty() {
            return Err(SiftError::InvalidParameter(
                "bulk ingest needs at least one document".to_string(),
            ));
        }

        let action = json!({"index": {"_index": self.config.index}}).to_string();
        let mut ndjson = String::new();
        for doc in docs {
            ndjson.push_str(&action);
            ndjson.push('\n');
            ndjson.push_str(&doc.to_string());
            ndjson.push('\n');
        }

        let mut url = self.url(&["_bulk"])?;
        url.query_pairs_mut().append_pair("refresh", "true");

        info!(index = %self.config.index, documents = docs.len(), "Bulk indexing");
        let builder = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(ndjson);
        let body = self.send(builder, "bulk").await?;

        let summary = bulk_summary(&body)?;
        if summary.errors {
            warn!(
                index = %self.config.index,
                failed = summary.failed,
                items = summary.items,
                "Bulk request completed with item failures"
            );
        }
        Ok(summary)
    }

    /// Field mappings (`mappings.properties`) of the configured index
    pub async fn get_mapping(&self) -> Result<Map<String, Value>> {
        let url = self.url(&[self.config.index.as_str(), "_mapping"])?;
        let body = self.send(self.request(Method::GET, url), "get_mapping").await?;

        // Aliases come back keyed by the concrete index name
        let entry = match body.get(&self.config.index) {
            Some(entry) => Some(entry),
            None => body.as_object().and_then(|m| m.values().next()),
        };
        entry
            .and_then(|e| e.get("mappings"))
            .and_then(|m| m.get("properties"))
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                SiftError::MalformedResponse(format!(
                    "no mappings.properties for index '{}'",
                    self.config.index
                ))
            })
    }

    /// Delete the configured index; returns the acknowledgement flag
    pub async fn delete_index(&self) -> Result<bool> {
        let url = self.url(&[self.config.index.as_str()])?;
        info!(index = %self.config.index, "Deleting index");
        let body = self.send(self.request(Method::DELETE, url), "delete_index").await?;
        Ok(body
            .get("acknowledged")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    // ========================================
    // Transport
    // ========================================

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SiftError::Config(format!("endpoint '{}' cannot be a base URL", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.auth {
            Some(AuthConfig::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            _ => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, operation: &'static str) -> Result<Value> {
        let result = self.send_inner(builder).await;
        if let Err(e) = &result {
            warn!(
                operation,
                error_type = e.error_type(),
                status = e.status(),
                "Search service call failed: {}",
                e
            );
        }
        result.map_err(SiftError::from)
    }

    async fn send_inner(&self, builder: RequestBuilder) -> std::result::Result<Value, ServiceError> {
        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(classify_transport)?;

        if status.is_client_error() {
            return Err(ServiceError::BadRequest {
                status: status.as_u16(),
                reason: error_reason(status, &text),
            });
        }
        if !status.is_success() {
            return Err(ServiceError::ServerError {
                status: status.as_u16(),
                reason: error_reason(status, &text),
            });
        }

        serde_json::from_str(&text).map_err(|e| ServiceError::ServerError {
            status: status.as_u16(),
            reason: format!("response body is not valid JSON: {}", e),
        })
    }
}

fn classify_transport(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(e.to_string())
    } else {
        // Connect failures and any other transport breakage
        ServiceError::Unreachable(e.to_string())
    }
}

/// Reason reported by the service, falling back to the status text
fn error_reason(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<EsErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

fn bulk_summary(body: &Value) -> Result<BulkSummary> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SiftError::MalformedResponse("bulk response has no items".to_string()))?;

    let failed = items
        .iter()
        .filter(|item| {
            item.as_object()
                .and_then(|ops| ops.values().next())
                .map(|op| {
                    op.get("error").is_some()
                        || op.get("status").and_then(Value::as_u64).unwrap_or(0) >= 300
                })
                .unwrap_or(true)
        })
        .count();

    Ok(BulkSummary {
        took: body.get("took").and_then(Value::as_u64).unwrap_or(0),
        errors: body.get("errors").and_then(Value::as_bool).unwrap_or(failed > 0),
        items: items.len(),
        failed,
    })
}
