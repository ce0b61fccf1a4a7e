use super::{parse_field_value, parse_value, print_json, FieldValue};
use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;
use sift::{BoolIntent, QueryIntent, ResponseNormalizer, SearchClient, SearchRequest};

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    /// Exact value match, e.g. `term sodium 0`
    Term { field: String, value: String },

    /// Bounded range, e.g. `range sodium --gte 0 --lte 10`
    Range {
        field: String,
        #[arg(long)]
        gte: Option<String>,
        #[arg(long)]
        lte: Option<String>,
    },

    /// Typo-tolerant match, e.g. `fuzzy title pinapple 2`
    Fuzzy {
        field: String,
        value: String,
        fuzziness: i64,
    },

    /// Relevance-ranked full-text match
    Match { field: String, query: String },

    /// Phrase match allowing `slop` positions between words
    Slop {
        field: String,
        query: String,
        slop: i64,
    },

    /// Query-string expression with a result cap
    Query {
        field: String,
        expression: String,
        size: usize,
    },

    /// Boolean combination of match and range clauses
    Boolean {
        /// Clause that must match (field=text)
        #[arg(long, value_parser = parse_field_value, default_value = "categories=Quick & Easy")]
        must: Vec<FieldValue>,

        /// Clause that must not match (field=text)
        #[arg(long, value_parser = parse_field_value, default_value = "ingredients=garlic")]
        must_not: Vec<FieldValue>,

        /// Upper-bound filter (field=n)
        #[arg(long, value_parser = parse_field_value, default_value = "sodium=50")]
        filter_lte: Vec<FieldValue>,

        /// Lower-bound filter (field=n)
        #[arg(long, value_parser = parse_field_value, default_value = "protein=5")]
        filter_gte: Vec<FieldValue>,
    },

    /// Lucene syntax sent as the `q` URI parameter
    Lucene {
        #[arg(default_value = "ingredients:broccoli AND calories:(>=100 AND <200)")]
        q: String,
    },
}

impl SearchCommand {
    fn into_request(self, index: &str) -> SearchRequest {
        let request = SearchRequest::new(index);
        match self {
            Self::Term { field, value } => {
                request.with_query(QueryIntent::term(field, parse_value(&value)))
            }
            Self::Range { field, gte, lte } => request.with_query(QueryIntent::range(
                field,
                gte.as_deref().map(parse_value),
                lte.as_deref().map(parse_value),
            )),
            Self::Fuzzy {
                field,
                value,
                fuzziness,
            } => request.with_query(QueryIntent::fuzzy(field, value, fuzziness)),
            Self::Match { field, query } => request.with_query(QueryIntent::matching(field, query)),
            Self::Slop { field, query, slop } => {
                request.with_query(QueryIntent::phrase(field, query, slop))
            }
            Self::Query {
                field,
                expression,
                size,
            } => request
                .with_query(QueryIntent::query_string(field, expression))
                .with_size(size),
            Self::Boolean {
                must,
                must_not,
                filter_lte,
                filter_gte,
            } => {
                let mut intent = BoolIntent::new();
                for fv in must {
                    intent = intent.must(QueryIntent::matching(fv.field, fv.value));
                }
                for fv in must_not {
                    intent = intent.must_not(QueryIntent::matching(fv.field, fv.value));
                }
                for fv in filter_lte {
                    let bound = parse_value(&fv.value);
                    intent = intent.filter(QueryIntent::range(fv.field, None, Some(bound)));
                }
                for fv in filter_gte {
                    let bound = parse_value(&fv.value);
                    intent = intent.filter(QueryIntent::range(fv.field, Some(bound), None));
                }
                request.with_query(intent.into())
            }
            Self::Lucene { q } => request.with_uri_query(q),
        }
    }
}

pub async fn run(client: &SearchClient, command: SearchCommand, json: bool) -> Result<()> {
    let request = command.into_request(client.index());
    let response = client.execute(&request).await?;

    if json {
        let sources = ResponseNormalizer::extract_sources(&response)?;
        return print_json(&Value::Array(sources));
    }

    let titles = ResponseNormalizer::extract_titles(&response)?;
    if let Some(total) = response.total_hits() {
        println!("{} hits, showing {}", total, titles.len());
    }
    for title in titles {
        println!("  {}", title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser, Debug)]
    struct Wrapper {
        #[command(subcommand)]
        command: SearchCommand,
    }

    fn body_for(args: &[&str]) -> Value {
        let mut argv = vec!["search"];
        argv.extend_from_slice(args);
        let wrapper = Wrapper::try_parse_from(argv).unwrap();
        let request = wrapper.command.into_request("recipes");
        serde_json::to_value(request.body().unwrap()).unwrap()
    }

    #[test]
    fn test_term_value_is_typed() {
        assert_eq!(
            body_for(&["term", "sodium", "0"]),
            json!({"query": {"term": {"sodium": 0}}})
        );
    }

    #[test]
    fn test_range_single_bound() {
        assert_eq!(
            body_for(&["range", "sodium", "--gte", "0"]),
            json!({"query": {"range": {"sodium": {"gte": 0}}}})
        );
    }

    #[test]
    fn test_query_sets_size() {
        assert_eq!(
            body_for(&["query", "ingredients", "(salmon|tuna) +tomato -onion", "100"]),
            json!({
                "query": {"query_string": {
                    "query": "(salmon|tuna) +tomato -onion",
                    "default_field": "ingredients"
                }},
                "size": 100
            })
        );
    }

    #[test]
    fn test_boolean_defaults_reproduce_recipe_search() {
        assert_eq!(
            body_for(&["boolean"]),
            json!({"query": {"bool": {
                "must": {"match": {"categories": {"query": "Quick & Easy"}}},
                "must_not": {"match": {"ingredients": {"query": "garlic"}}},
                "filter": [
                    {"range": {"sodium": {"lte": 50}}},
                    {"range": {"protein": {"gte": 5}}}
                ]
            }}})
        );
    }

    #[test]
    fn test_boolean_multiple_must() {
        let body = body_for(&["boolean", "--must", "title=soup", "--must", "categories=Vegan"]);
        assert_eq!(body["query"]["bool"]["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_lucene_default_has_no_body_query() {
        let wrapper = Wrapper::try_parse_from(["search", "lucene"]).unwrap();
        let request = wrapper.command.into_request("recipes");
        assert_eq!(
            request.uri_query(),
            Some("ingredients:broccoli AND calories:(>=100 AND <200)")
        );
    }
}
