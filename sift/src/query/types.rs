//! Elasticsearch Query DSL types
//!
//! These types represent the subset of the Query DSL that sift emits.

use crate::aggregation::EsAggregation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Root search request body
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EsSearchRequest {
    /// The query to execute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<EsQuery>,

    /// Aggregations keyed by caller-chosen name
    #[serde(default, alias = "aggregations", skip_serializing_if = "Option::is_none")]
    pub aggs: Option<HashMap<String, EsAggregation>>,

    /// Maximum number of hits to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// Query clauses, keyed by type name on the wire
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EsQuery {
    /// Term query (exact match, not analyzed)
    Term(HashMap<String, Value>),

    /// Range query
    Range(HashMap<String, RangeParams>),

    /// Fuzzy query
    Fuzzy(HashMap<String, FuzzyParams>),

    /// Match query (analyzed full-text)
    Match(HashMap<String, MatchQuery>),

    /// Match phrase query
    MatchPhrase(HashMap<String, MatchPhraseQuery>),

    /// Query string (Lucene syntax)
    QueryString(QueryStringQuery),

    /// Bool query (must, must_not, filter)
    Bool(BoolQuery),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RangeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FuzzyParams {
    pub value: String,
    pub fuzziness: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MatchQuery {
    Simple(String),
    Object { query: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MatchPhraseQuery {
    Simple(String),
    Object {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slop: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryStringQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must: Option<QueryList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_not: Option<QueryList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<EsQuery>>,
}

/// One clause or several; the service accepts both shapes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QueryList {
    Single(Box<EsQuery>),
    Multiple(Vec<EsQuery>),
}

impl QueryList {
    /// `None` for no clauses, `Single` for one, `Multiple` otherwise
    pub fn from_vec(mut clauses: Vec<EsQuery>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop().map(|q| QueryList::Single(Box::new(q))),
            _ => Some(QueryList::Multiple(clauses)),
        }
    }

    pub fn into_vec(self) -> Vec<EsQuery> {
        match self {
            QueryList::Single(q) => vec![*q],
            QueryList::Multiple(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ===================================================================
    // Serialization shape
    // ===================================================================

    #[test]
    fn test_serialize_term() {
        let q = EsQuery::Term(HashMap::from([("sodium".to_string(), json!(0))]));
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"term": {"sodium": 0}}));
    }

    #[test]
    fn test_serialize_range_omits_missing_bound() {
        let q = EsQuery::Range(HashMap::from([(
            "protein".to_string(),
            RangeParams {
                gte: Some(json!(5)),
                lte: None,
            },
        )]));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"range": {"protein": {"gte": 5}}})
        );
    }

    #[test]
    fn test_serialize_match_phrase_with_slop() {
        let q = EsQuery::MatchPhrase(HashMap::from([(
            "directions".to_string(),
            MatchPhraseQuery::Object {
                query: "pizza pineapple".to_string(),
                slop: Some(10),
            },
        )]));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"match_phrase": {"directions": {"query": "pizza pineapple", "slop": 10}}})
        );
    }

    #[test]
    fn test_serialize_query_string() {
        let q = EsQuery::QueryString(QueryStringQuery {
            query: "(salmon|tuna) +tomato -onion".to_string(),
            default_field: Some("ingredients".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"query_string": {
                "query": "(salmon|tuna) +tomato -onion",
                "default_field": "ingredients"
            }})
        );
    }

    #[test]
    fn test_empty_request_serializes_to_empty_object() {
        let req = EsSearchRequest::default();
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({}));
    }

    // ===================================================================
    // Deserialization (bodies written by hand or logged by other tools)
    // ===================================================================

    #[test]
    fn test_deserialize_bool_single_must() {
        let q: EsQuery = serde_json::from_value(json!({
            "bool": {
                "must": {"match": {"categories": "Quick & Easy"}},
                "must_not": {"match": {"ingredients": "garlic"}},
                "filter": [
                    {"range": {"sodium": {"lte": 50}}},
                    {"range": {"protein": {"gte": 5}}}
                ]
            }
        }))
        .unwrap();
        match q {
            EsQuery::Bool(b) => {
                let must = b.must.unwrap().into_vec();
                assert_eq!(must.len(), 1);
                match &must[0] {
                    EsQuery::Match(m) => assert!(
                        matches!(m.get("categories").unwrap(), MatchQuery::Simple(s) if s == "Quick & Easy")
                    ),
                    _ => panic!("Expected Match"),
                }
                assert_eq!(b.filter.unwrap().len(), 2);
            }
            _ => panic!("Expected Bool"),
        }
    }

    #[test]
    fn test_deserialize_search_request_with_aggs_alias() {
        let req: EsSearchRequest = serde_json::from_value(json!({
            "aggregations": {
                "average-rating": {"avg": {"field": "rating"}}
            },
            "size": 0
        }))
        .unwrap();
        assert_eq!(req.size, Some(0));
        assert!(req.aggs.unwrap().contains_key("average-rating"));
    }

    // ===================================================================
    // QueryList
    // ===================================================================

    #[test]
    fn test_query_list_from_vec() {
        assert!(QueryList::from_vec(vec![]).is_none());

        let one = QueryList::from_vec(vec![EsQuery::Term(HashMap::new())]).unwrap();
        assert!(matches!(one, QueryList::Single(_)));

        let two = QueryList::from_vec(vec![
            EsQuery::Term(HashMap::new()),
            EsQuery::Term(HashMap::new()),
        ])
        .unwrap();
        assert_eq!(two.into_vec().len(), 2);
    }
}
