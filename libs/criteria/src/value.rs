//! Bindable values.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical date/time layout handed to SQL drivers.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A scalar that can be bound to a single placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Drivers get this as text once the parameters are normalized.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Replace a date/time with its canonical text form; other values pass through.
    pub fn into_bindable(self) -> Self {
        match self {
            Self::DateTime(dt) => Self::Text(dt.format(DATETIME_FORMAT).to_string()),
            other => other,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::DateTime(dt) => serializer.collect_str(&dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// Value held by one parameter-store entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Scalar(SqlValue),
    /// Whole IN-list bound to one placeholder (non-expanded mode).
    List(Vec<SqlValue>),
}

impl BindValue {
    pub fn as_list(&self) -> Option<&[SqlValue]> {
        match self {
            Self::List(values) => Some(values),
            Self::Scalar(_) => None,
        }
    }
}

impl Serialize for BindValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(v) => v.serialize(serializer),
            Self::List(values) => values.serialize(serializer),
        }
    }
}

impl From<SqlValue> for BindValue {
    fn from(value: SqlValue) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<SqlValue>> for BindValue {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::List(values)
    }
}
