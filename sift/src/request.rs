//! Search request assembly

use crate::aggregation::AggregationBuilder;
use crate::error::SiftError;
use crate::intent::{NamedAggregation, QueryIntent};
use crate::query::{EsSearchRequest, QueryBuilder};
use crate::Result;

/// A single search call: an optional query, any number of named
/// aggregations, a hit cap, and the target index.
///
/// Built with the `with_*` methods, then handed to
/// [`SearchClient::execute`](crate::SearchClient::execute).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    index: String,
    query: Option<QueryIntent>,
    aggregations: Vec<NamedAggregation>,
    size: Option<usize>,
    uri_query: Option<String>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            query: None,
            aggregations: Vec::new(),
            size: None,
            uri_query: None,
        }
    }

    pub fn with_query(mut self, query: QueryIntent) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<NamedAggregation>) -> Self {
        self.aggregations.push(aggregation.into());
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Search with a Lucene expression sent as the `q` URI parameter
    /// instead of a query body
    pub fn with_uri_query(mut self, q: impl Into<String>) -> Self {
        self.uri_query = Some(q.into());
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn query(&self) -> Option<&QueryIntent> {
        self.query.as_ref()
    }

    pub fn aggregations(&self) -> &[NamedAggregation] {
        &self.aggregations
    }

    pub fn uri_query(&self) -> Option<&str> {
        self.uri_query.as_deref()
    }

    /// Hit cap sent to the service.
    ///
    /// An aggregation-only request with no explicit size asks for zero hits.
    pub fn effective_size(&self) -> Option<usize> {
        match self.size {
            Some(size) => Some(size),
            None if self.query.is_none()
                && self.uri_query.is_none()
                && !self.aggregations.is_empty() =>
            {
                Some(0)
            }
            None => None,
        }
    }

    /// Build the request body. Nothing is sent if any intent is invalid.
    pub fn body(&self) -> Result<EsSearchRequest> {
        if self.index.trim().is_empty() {
            return Err(SiftError::InvalidParameter(
                "target index must not be empty".to_string(),
            ));
        }
        if self.query.is_some() && self.uri_query.is_some() {
            return Err(SiftError::InvalidParameter(
                "a request carries either a query body or a URI query, not both".to_string(),
            ));
        }

        let query = self.query.as_ref().map(QueryBuilder::build).transpose()?;
        let aggs = if self.aggregations.is_empty() {
            None
        } else {
            Some(AggregationBuilder::build_all(&self.aggregations)?)
        };

        // URI searches carry the size as a `size=` parameter instead
        let size = match self.uri_query {
            Some(_) => None,
            None => self.effective_size(),
        };

        Ok(EsSearchRequest { query, aggs, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{AggregationIntent, MetricKind};
    use serde_json::json;

    #[test]
    fn test_query_only_body() {
        let req = SearchRequest::new("recipes").with_query(QueryIntent::term("sodium", 0));
        let body = serde_json::to_value(req.body().unwrap()).unwrap();
        assert_eq!(body, json!({"query": {"term": {"sodium": 0}}}));
    }

    #[test]
    fn test_aggregation_only_suppresses_hits() {
        let req = SearchRequest::new("recipes").with_aggregation(
            AggregationIntent::metric(MetricKind::Avg, "rating").named("average-rating"),
        );
        assert_eq!(req.effective_size(), Some(0));
        let body = serde_json::to_value(req.body().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "aggs": {"average-rating": {"avg": {"field": "rating"}}},
                "size": 0
            })
        );
    }

    #[test]
    fn test_explicit_size_wins() {
        let req = SearchRequest::new("recipes")
            .with_aggregation(AggregationIntent::terms("categories.keyword", None))
            .with_size(5);
        assert_eq!(req.effective_size(), Some(5));
    }

    #[test]
    fn test_query_with_size() {
        let req = SearchRequest::new("recipes")
            .with_query(QueryIntent::query_string(
                "ingredients",
                "(salmon|tuna) +tomato -onion",
            ))
            .with_size(100);
        let body = req.body().unwrap();
        assert_eq!(body.size, Some(100));
        assert!(body.query.is_some());
        assert!(body.aggs.is_none());
    }

    #[test]
    fn test_empty_request_has_no_size() {
        let req = SearchRequest::new("recipes");
        assert_eq!(req.effective_size(), None);
        assert_eq!(serde_json::to_value(req.body().unwrap()).unwrap(), json!({}));
    }

    #[test]
    fn test_uri_query_keeps_hits() {
        let req = SearchRequest::new("recipes")
            .with_uri_query("ingredients:broccoli AND calories:(>=100 AND <200)");
        assert_eq!(req.effective_size(), None);
        assert!(req.body().unwrap().query.is_none());
    }

    #[test]
    fn test_uri_query_size_stays_out_of_body() {
        let req = SearchRequest::new("recipes")
            .with_uri_query("ingredients:broccoli")
            .with_size(5);
        assert_eq!(req.effective_size(), Some(5));
        assert_eq!(serde_json::to_value(req.body().unwrap()).unwrap(), json!({}));
    }

    #[test]
    fn test_uri_query_and_body_query_conflict() {
        let req = SearchRequest::new("recipes")
            .with_query(QueryIntent::term("sodium", 0))
            .with_uri_query("sodium:0");
        assert!(matches!(req.body(), Err(SiftError::InvalidParameter(_))));
    }

    #[test]
    fn test_invalid_intent_fails_body() {
        let req = SearchRequest::new("recipes").with_query(QueryIntent::range("sodium", None, None));
        assert!(matches!(req.body(), Err(SiftError::InvalidRange(_))));
    }

    #[test]
    fn test_empty_index_fails() {
        let req = SearchRequest::new(" ").with_query(QueryIntent::term("sodium", 0));
        assert!(matches!(req.body(), Err(SiftError::InvalidParameter(_))));
    }
}
