//! Criteria and parameters from JSON.
//!
//! Criteria grammar (`serde_json` keeps object key order):
//! - `null`, strings, numbers, booleans are `Null` / `Scalar`
//! - arrays are `List` and may only hold scalars or `null`
//! - an object whose first key is an operator is an operator chain:
//!   `{">": 100, "0": "AND", "<": 200}`; all-digit keys whose value is
//!   `"AND"` / `"OR"` are the markers between comparisons
//! - an object whose first key is not an operator is read as a list of
//!   its values
//!
//! In strict mode every key of an operator chain must be an operator or a
//! marker, and value-list objects are rejected.

use crate::criteria::{ConditionEntry, Conjunction, Criteria, Criterion, Operator};
use crate::error::{CriteriaError, Result};
use crate::params::ParameterStore;
use crate::value::{BindValue, SqlValue, DATETIME_FORMAT};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Object key marking a date/time parameter: `{"$datetime": "2024-01-31 08:00:00"}`.
pub const DATETIME_KEY: &str = "$datetime";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub strict: bool,
}

impl JsonOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

pub fn criteria_from_str(input: &str, options: JsonOptions) -> Result<Criteria> {
    let value: Value = serde_json::from_str(input)?;
    criteria_from_json(&value, options)
}

/// Parse a criteria object (`{"field": <criterion>, ...}`).
pub fn criteria_from_json(value: &Value, options: JsonOptions) -> Result<Criteria> {
    let Value::Object(map) = value else {
        return Err(CriteriaError::InvalidValue {
            key: String::new(),
            message: "criteria must be a JSON object".to_string(),
        });
    };
    map.iter()
        .map(|(key, v)| -> Result<(String, Criterion)> {
            Ok((key.clone(), criterion_from_json(key, v, options)?))
        })
        .collect()
}

/// Like [`criteria_from_json`], but a value that is not a field map is taken
/// as the criterion for `key` itself (`"open"` means `{"<key>": "open"}`,
/// `{">": 3}` means `{"<key>": {">": 3}}`).
pub fn criteria_for_key(value: &Value, key: &str, options: JsonOptions) -> Result<Criteria> {
    match value {
        Value::Object(map) if !starts_with_operator(map) => criteria_from_json(value, options),
        other => Ok(Criteria::single(key, criterion_from_json(key, other, options)?)),
    }
}

fn starts_with_operator(map: &Map<String, Value>) -> bool {
    map.keys()
        .next()
        .is_some_and(|first| Operator::parse(first).is_some())
}

pub fn criterion_from_json(key: &str, value: &Value, options: JsonOptions) -> Result<Criterion> {
    match value {
        Value::Null => Ok(Criterion::Null),
        Value::Array(items) => list_from_values(key, items.iter()),
        Value::Object(map) => object_criterion(key, map, options),
        scalar => Ok(Criterion::Scalar(scalar_from_json(key, scalar)?)),
    }
}

fn object_criterion(
    key: &str,
    map: &Map<String, Value>,
    options: JsonOptions,
) -> Result<Criterion> {
    if !starts_with_operator(map) {
        if options.strict {
            let first = map.keys().next().cloned().unwrap_or_default();
            return Err(CriteriaError::UnknownOperator(first));
        }
        return list_from_values(key, map.values());
    }

    let mut entries = Vec::with_capacity(map.len());
    for (k, v) in map {
        if let Some(marker) = marker(k, v) {
            entries.push(ConditionEntry::Conjunction(marker));
        } else if let Some(operator) = Operator::parse(k) {
            entries.push(ConditionEntry::Comparison {
                operator,
                value: criterion_from_json(key, v, options)?,
            });
        } else if options.strict {
            return Err(CriteriaError::UnknownOperator(k.clone()));
        } else {
            tracing::debug!(key, operator = %k, "skipping unknown operator");
        }
    }
    Ok(Criterion::Conditions(entries))
}

fn marker(k: &str, v: &Value) -> Option<Conjunction> {
    if k.is_empty() || !k.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    v.as_str().and_then(Conjunction::parse)
}

fn list_from_values<'a>(key: &str, items: impl Iterator<Item = &'a Value>) -> Result<Criterion> {
    let values = items
        .map(|item| match item {
            Value::Null => Ok(None),
            Value::Array(_) | Value::Object(_) => Err(CriteriaError::NestedList(key.to_string())),
            scalar => scalar_from_json(key, scalar).map(Some),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Criterion::List(values))
}

fn scalar_from_json(key: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Float(f))
            } else {
                Err(CriteriaError::InvalidValue {
                    key: key.to_string(),
                    message: format!("number {n} is out of range"),
                })
            }
        }
        other => Err(CriteriaError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a scalar, got {other}"),
        }),
    }
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| CriteriaError::InvalidDateTime(s.to_string()))
}

pub fn params_from_str(input: &str) -> Result<ParameterStore> {
    let value: Value = serde_json::from_str(input)?;
    params_from_json(&value)
}

/// Parse a bind-parameter object: scalars, arrays of scalars and
/// `{"$datetime": "..."}` values.
pub fn params_from_json(value: &Value) -> Result<ParameterStore> {
    let Value::Object(map) = value else {
        return Err(CriteriaError::InvalidValue {
            key: String::new(),
            message: "parameters must be a JSON object".to_string(),
        });
    };
    map.iter()
        .map(|(name, v)| -> Result<(String, BindValue)> {
            Ok((name.clone(), bind_value_from_json(name, v)?))
        })
        .collect()
}

fn bind_value_from_json(name: &str, value: &Value) -> Result<BindValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| param_scalar(name, item))
            .collect::<Result<Vec<_>>>()
            .map(BindValue::List),
        other => param_scalar(name, other).map(BindValue::Scalar),
    }
}

fn param_scalar(name: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Object(map) => match map.get(DATETIME_KEY) {
            Some(Value::String(s)) if map.len() == 1 => parse_datetime(s).map(SqlValue::DateTime),
            _ => Err(CriteriaError::InvalidValue {
                key: name.to_string(),
                message: format!("objects must be {{\"{DATETIME_KEY}\": \"...\"}}"),
            }),
        },
        Value::Array(_) => Err(CriteriaError::NestedList(name.to_string())),
        Value::Null => Err(CriteriaError::InvalidValue {
            key: name.to_string(),
            message: "null cannot be bound; use an IS NULL criterion".to_string(),
        }),
        scalar => scalar_from_json(name, scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_object_becomes_condition_chain() {
        let c = criterion_from_json(
            "price",
            &json!({">": 100, "0": "and", "<": 200}),
            JsonOptions::default(),
        )
        .unwrap();
        assert_eq!(c, Criterion::condition(Operator::Gt, 100).and(Operator::Lt, 200));
    }

    #[test]
    fn lowercase_operators_are_recognised() {
        let c = criterion_from_json("n", &json!({"like": "a%"}), JsonOptions::default()).unwrap();
        assert_eq!(c, Criterion::condition(Operator::Like, "a%"));
    }

    #[test]
    fn array_becomes_list_with_nulls() {
        let c = criterion_from_json("t", &json!(["a", null, 3]), JsonOptions::default()).unwrap();
        assert_eq!(
            c,
            Criterion::List(vec![Some(SqlValue::from("a")), None, Some(SqlValue::Integer(3))])
        );
    }

    #[test]
    fn nested_arrays_are_rejected() {
        let err = criterion_from_json("t", &json!([[1]]), JsonOptions::default()).unwrap_err();
        assert!(matches!(err, CriteriaError::NestedList(k) if k == "t"));
    }

    #[test]
    fn unknown_operator_is_skipped_unless_strict() {
        let value = json!({"=": 1, "BETWEEN": 2});
        let lenient = criterion_from_json("x", &value, JsonOptions::default()).unwrap();
        assert_eq!(lenient, Criterion::condition(Operator::Eq, 1));

        let strict = criterion_from_json("x", &value, JsonOptions::strict()).unwrap_err();
        assert!(matches!(strict, CriteriaError::UnknownOperator(op) if op == "BETWEEN"));
    }

    #[test]
    fn non_operator_object_is_a_value_list() {
        let value = json!({"a": 1, "b": null});
        let lenient = criterion_from_json("x", &value, JsonOptions::default()).unwrap();
        assert_eq!(lenient, Criterion::List(vec![Some(SqlValue::Integer(1)), None]));
        assert!(criterion_from_json("x", &value, JsonOptions::strict()).is_err());
    }

    #[test]
    fn criteria_keep_key_order() {
        let criteria =
            criteria_from_str(r#"{"b": 1, "a": null}"#, JsonOptions::default()).unwrap();
        let keys: Vec<_> = criteria.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn bare_value_is_shorthand_for_key() {
        let criteria = criteria_for_key(&json!("open"), "status", JsonOptions::default()).unwrap();
        assert_eq!(criteria, Criteria::single("status", "open"));

        let criteria =
            criteria_for_key(&json!({"other": 1}), "status", JsonOptions::default()).unwrap();
        assert!(!criteria.contains_key("status"));

        let criteria =
            criteria_for_key(&json!({">": 3}), "price", JsonOptions::default()).unwrap();
        assert!(matches!(
            criteria.get("price"),
            Some(Criterion::Conditions(entries)) if entries.len() == 1
        ));
    }

    #[test]
    fn params_accept_datetimes_and_lists() {
        let params =
            params_from_str(r#"{"since": {"$datetime": "2021-06-01 10:00:00"}, "ids": [1, 2]}"#)
                .unwrap();
        assert!(matches!(
            params.get("since"),
            Some(BindValue::Scalar(SqlValue::DateTime(_)))
        ));
        assert_eq!(params.get("ids").and_then(BindValue::as_list).map(<[_]>::len), Some(2));
    }

    #[test]
    fn params_reject_null_and_bad_dates() {
        assert!(params_from_str(r#"{"a": null}"#).is_err());
        assert!(matches!(
            params_from_str(r#"{"a": {"$datetime": "yesterday"}}"#),
            Err(CriteriaError::InvalidDateTime(_))
        ));
    }
}
