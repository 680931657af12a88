//! Lenient scalar conversion.
//!
//! Clients encode some scalars inconsistently (booleans as `1`/`"1"`,
//! timestamps as numbers or strings, empty maps as `[]`). These helpers
//! normalize such values and are used as serde `deserialize_with` hooks.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Convert a JSON value to a string representation for database storage.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "1" } else { "" }.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(), // Arrays and objects as JSON strings
    }
}

/// Convert a JSON value to a boolean if possible.
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::Null => Some(false),
        _ => None,
    }
}

pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_bool(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a boolean, got {}", value)))
}

/// Accept an object, or an empty list standing in for an empty object.
pub fn map_or_empty_list<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Accept a list, or an object whose values form the list (in key order).
pub fn list_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Array(_) => serde_json::from_value(value).map_err(D::Error::custom),
        Value::Object(map) => map
            .into_iter()
            .map(|(_, item)| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        other => Err(D::Error::custom(format!(
            "expected a list, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("7.4.3")), "7.4.3");
        assert_eq!(value_to_string(&json!(1700000000)), "1700000000");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(true)), "1");
        assert_eq!(value_to_string(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_value_to_bool() {
        assert_eq!(value_to_bool(&json!(true)), Some(true));
        assert_eq!(value_to_bool(&json!(1)), Some(true));
        assert_eq!(value_to_bool(&json!("1")), Some(true));
        assert_eq!(value_to_bool(&json!("false")), Some(false));
        assert_eq!(value_to_bool(&json!(0)), Some(false));
        assert_eq!(value_to_bool(&json!(null)), Some(false));
        assert_eq!(value_to_bool(&json!("maybe")), None);
        assert_eq!(value_to_bool(&json!([1])), None);
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "map_or_empty_list")]
        map: BTreeMap<String, u32>,
        #[serde(deserialize_with = "list_or_map")]
        list: Vec<u32>,
    }

    #[test]
    fn test_empty_list_as_map() {
        let holder: Holder = serde_json::from_value(json!({"map": [], "list": []})).unwrap();
        assert!(holder.map.is_empty());
        assert!(holder.list.is_empty());
    }

    #[test]
    fn test_object_as_list() {
        let holder: Holder =
            serde_json::from_value(json!({"map": {"a": 1}, "list": {"0": 4, "2": 5}})).unwrap();
        assert_eq!(holder.map.get("a"), Some(&1));
        assert_eq!(holder.list, vec![4, 5]);
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        assert!(serde_json::from_value::<Holder>(json!({"map": [1], "list": []})).is_err());
        assert!(serde_json::from_value::<Holder>(json!({"map": {}, "list": "x"})).is_err());
    }
}
