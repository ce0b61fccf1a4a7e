pub mod admin;
pub mod aggregate;
pub mod search;

use anyhow::Result;
use serde_json::Value;

/// Command-line value: JSON when it parses (`0`, `true`, `"x"`), else the
/// raw string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `field=value` pair for clause flags
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub field: String,
    pub value: String,
}

pub fn parse_field_value(raw: &str) -> Result<FieldValue, String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok(FieldValue {
            field: field.trim().to_string(),
            value: value.to_string(),
        }),
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("0"), json!(0));
        assert_eq!(parse_value("2.5"), json!(2.5));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("pinapple"), json!("pinapple"));
        assert_eq!(parse_value("Quick & Easy"), json!("Quick & Easy"));
    }

    #[test]
    fn test_parse_field_value() {
        assert_eq!(
            parse_field_value("categories=Quick & Easy").unwrap(),
            FieldValue {
                field: "categories".to_string(),
                value: "Quick & Easy".to_string()
            }
        );
        assert_eq!(parse_field_value("sodium=").unwrap().value, "");
        assert!(parse_field_value("garlic").is_err());
        assert!(parse_field_value("=garlic").is_err());
    }
}
