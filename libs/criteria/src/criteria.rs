//! Criteria data model.
//!
//! A [`Criteria`] maps field keys to a [`Criterion`]:
//! - `Null` compiles to `IS NULL` / `IS NOT NULL`
//! - `Scalar` compiles to a single comparison
//! - `List` compiles to `IN (...)` plus an optional null test
//! - `Conditions` is an ordered chain of operator/value pairs with optional
//!   `AND` / `OR` markers between them (`foo > 100 AND foo < 200`)

use crate::value::SqlValue;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Self; 9] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Like,
        Self::In,
        Self::NotIn,
    ];

    /// Case-insensitive lookup (`like`, `not in`, `<>` ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "LIKE" => Some(Self::Like),
            "IN" => Some(Self::In),
            "NOT IN" => Some(Self::NotIn),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    /// `<>` and `NOT IN` flip null tests and membership tests.
    pub fn is_negated(&self) -> bool {
        matches!(self, Self::Ne | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl std::str::FromStr for Operator {
    type Err = crate::CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::CriteriaError::UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Null,
    Scalar(SqlValue),
    /// `None` entries add an `IS NULL` alternative to the membership test.
    List(Vec<Option<SqlValue>>),
    Conditions(Vec<ConditionEntry>),
}

impl Criterion {
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<V>>,
        V: Into<SqlValue>,
    {
        Self::List(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Start an operator chain: `Criterion::condition(Operator::Gt, 100)`.
    pub fn condition(operator: Operator, value: impl Into<Criterion>) -> Self {
        Self::Conditions(vec![ConditionEntry::Comparison {
            operator,
            value: value.into(),
        }])
    }

    /// Append `<conjunction> <operator> <value>` to an operator chain.
    ///
    /// Any other criterion is first wrapped as an `=` comparison.
    pub fn then(
        self,
        conjunction: Conjunction,
        operator: Operator,
        value: impl Into<Criterion>,
    ) -> Self {
        let mut entries = match self {
            Self::Conditions(entries) => entries,
            other => vec![ConditionEntry::Comparison {
                operator: Operator::Eq,
                value: other,
            }],
        };
        entries.push(ConditionEntry::Conjunction(conjunction));
        entries.push(ConditionEntry::Comparison {
            operator,
            value: value.into(),
        });
        Self::Conditions(entries)
    }

    pub fn and(self, operator: Operator, value: impl Into<Criterion>) -> Self {
        self.then(Conjunction::And, operator, value)
    }

    pub fn or(self, operator: Operator, value: impl Into<Criterion>) -> Self {
        self.then(Conjunction::Or, operator, value)
    }
}

macro_rules! scalar_criterion_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Criterion {
                fn from(value: $ty) -> Self {
                    Self::Scalar(SqlValue::from(value))
                }
            }
        )*
    };
}

scalar_criterion_from!(&str, String, i64, i32, f64, bool, chrono::NaiveDateTime);

impl From<SqlValue> for Criterion {
    fn from(value: SqlValue) -> Self {
        Self::Scalar(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEntry {
    Comparison { operator: Operator, value: Criterion },
    Conjunction(Conjunction),
}

/// Field key to criterion, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, Criterion)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a one-entry criteria.
    pub fn single(key: impl Into<String>, criterion: impl Into<Criterion>) -> Self {
        Self::new().with(key, criterion)
    }

    pub fn with(mut self, key: impl Into<String>, criterion: impl Into<Criterion>) -> Self {
        self.insert(key, criterion);
        self
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, criterion: impl Into<Criterion>) {
        let key = key.into();
        let criterion = criterion.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = criterion,
            None => self.entries.push((key, criterion)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Criterion)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, Criterion)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (k, c) in iter {
            criteria.insert(k, c);
        }
        criteria
    }
}
