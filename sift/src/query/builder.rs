//! Builds Query DSL clauses from query intents

use crate::error::SiftError;
use crate::intent::{require_field, BoolIntent, QueryIntent};
use crate::query::types::*;
use crate::Result;
use std::collections::HashMap;

/// Translates [`QueryIntent`]s into Query DSL clauses
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the clause for a single intent.
    ///
    /// Fails before any request is made when a field name is empty, a range
    /// has no bounds, or fuzziness / slop is negative. Query-string
    /// expressions are not inspected; the service reports syntax errors.
    pub fn build(intent: &QueryIntent) -> Result<EsQuery> {
        match intent {
            QueryIntent::Term { field, value } => {
                let field = require_field(field, "query")?;
                Ok(EsQuery::Term(single(field, value.clone())))
            }

            QueryIntent::Range { field, gte, lte } => {
                let field = require_field(field, "query")?;
                // A null bound is no bound
                let gte = gte.as_ref().filter(|v| !v.is_null());
                let lte = lte.as_ref().filter(|v| !v.is_null());
                if gte.is_none() && lte.is_none() {
                    return Err(SiftError::InvalidRange(format!(
                        "range on '{}' needs at least one of gte / lte",
                        field
                    )));
                }
                Ok(EsQuery::Range(single(
                    field,
                    RangeParams {
                        gte: gte.cloned(),
                        lte: lte.cloned(),
                    },
                )))
            }

            QueryIntent::Fuzzy {
                field,
                value,
                fuzziness,
            } => {
                let field = require_field(field, "query")?;
                let fuzziness = non_negative("fuzziness", *fuzziness)?;
                Ok(EsQuery::Fuzzy(single(
                    field,
                    FuzzyParams {
                        value: value.clone(),
                        fuzziness,
                    },
                )))
            }

            QueryIntent::Match { field, query } => {
                let field = require_field(field, "query")?;
                Ok(EsQuery::Match(single(
                    field,
                    MatchQuery::Object {
                        query: query.clone(),
                    },
                )))
            }

            QueryIntent::MatchPhraseSlop { field, query, slop } => {
                let field = require_field(field, "query")?;
                let slop = non_negative("slop", *slop)?;
                Ok(EsQuery::MatchPhrase(single(
                    field,
                    MatchPhraseQuery::Object {
                        query: query.clone(),
                        slop: Some(slop),
                    },
                )))
            }

            QueryIntent::QueryString {
                default_field,
                query,
            } => {
                let field = require_field(default_field, "query_string")?;
                Ok(EsQuery::QueryString(QueryStringQuery {
                    query: query.clone(),
                    default_field: Some(field.to_string()),
                }))
            }

            QueryIntent::Boolean(bool_intent) => Self::build_bool(bool_intent),
        }
    }

    fn build_bool(bool_intent: &BoolIntent) -> Result<EsQuery> {
        if bool_intent.is_empty() {
            return Err(SiftError::InvalidParameter(
                "bool query needs at least one must, must_not or filter clause".to_string(),
            ));
        }

        let must = Self::build_all(&bool_intent.must)?;
        let must_not = Self::build_all(&bool_intent.must_not)?;
        let filter = Self::build_all(&bool_intent.filter)?;

        Ok(EsQuery::Bool(BoolQuery {
            must: QueryList::from_vec(must),
            must_not: QueryList::from_vec(must_not),
            filter: (!filter.is_empty()).then_some(filter),
        }))
    }

    fn build_all(intents: &[QueryIntent]) -> Result<Vec<EsQuery>> {
        intents.iter().map(Self::build).collect()
    }
}

fn non_negative(name: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        SiftError::InvalidParameter(format!(
            "{} must be a non-negative integer, got {}",
            name, value
        ))
    })
}

fn single<T>(field: &str, value: T) -> HashMap<String, T> {
    HashMap::from([(field.to_string(), value)])
}
