//! Named to positional placeholder rewrite (`:name` to `$n`).

use crate::error::{CriteriaError, Result};
use crate::normalize::PreparedQuery;
use crate::placeholder::rewrite_placeholders;
use crate::value::{BindValue, SqlValue};
use std::collections::HashMap;

/// Rewrite a normalized query for drivers with `$1`-style placeholders.
///
/// Indexes follow first appearance; a name used twice reuses its index.
/// Parameters the SQL never references are not bound.
pub fn to_positional(query: &PreparedQuery) -> Result<(String, Vec<SqlValue>)> {
    let mut indexes: HashMap<String, usize> = HashMap::new();
    let mut binds: Vec<SqlValue> = Vec::new();
    let mut failure: Option<CriteriaError> = None;

    let sql = rewrite_placeholders(&query.sql, |name| {
        if failure.is_some() {
            return None;
        }
        if let Some(idx) = indexes.get(name) {
            return Some(format!("${idx}"));
        }
        match query.params.get(name) {
            Some(BindValue::Scalar(v)) => {
                binds.push(v.clone().into_bindable());
                indexes.insert(name.to_string(), binds.len());
                Some(format!("${}", binds.len()))
            }
            Some(BindValue::List(_)) => {
                failure = Some(CriteriaError::InvalidValue {
                    key: name.to_string(),
                    message: "list parameters must be normalized before binding".to_string(),
                });
                None
            }
            None => {
                failure = Some(CriteriaError::UnboundPlaceholder(name.to_string()));
                None
            }
        }
    });

    if let Some(err) = failure {
        return Err(err);
    }
    Ok((sql, binds))
}
