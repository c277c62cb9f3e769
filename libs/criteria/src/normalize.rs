//! Parameter normalization before execution.
//!
//! Drivers bind neither date/times nor whole lists to a single named
//! placeholder. [`normalize`] turns:
//! - `DateTime` values into `YYYY-MM-DD HH:MM:SS` text
//! - a list bound as `:tags` into `:tags1, :tags2, ...`, one value each

use crate::params::{NameAllocator, ParameterStore};
use crate::placeholder::rewrite_placeholders;
use crate::value::BindValue;
use serde::Serialize;
use std::collections::HashMap;

/// SQL text with the named parameters it references.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreparedQuery {
    pub sql: String,
    pub params: ParameterStore,
}

impl PreparedQuery {
    pub fn new(sql: impl Into<String>, params: ParameterStore) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

pub fn normalize(sql: &str, params: &ParameterStore) -> PreparedQuery {
    let mut names = NameAllocator::for_store(params);
    let mut out = ParameterStore::new();
    let mut expansions: HashMap<&str, String> = HashMap::new();

    for (name, value) in params.iter() {
        match value {
            BindValue::Scalar(v) => out.insert(name, BindValue::Scalar(v.clone().into_bindable())),
            BindValue::List(values) => {
                let mut placeholders = Vec::with_capacity(values.len());
                for (i, v) in values.iter().enumerate() {
                    let expanded = names.claim(&format!("{name}{}", i + 1));
                    placeholders.push(format!(":{expanded}"));
                    out.insert(expanded, BindValue::Scalar(v.clone().into_bindable()));
                }
                tracing::trace!(name, count = values.len(), "expanding list parameter");
                let replacement = if placeholders.is_empty() {
                    // `IN (NULL)` matches nothing, like an empty list would.
                    "NULL".to_string()
                } else {
                    placeholders.join(", ")
                };
                expansions.insert(name, replacement);
            }
        }
    }

    let sql = if expansions.is_empty() {
        sql.to_string()
    } else {
        rewrite_placeholders(sql, |name| expansions.get(name).cloned())
    };

    tracing::debug!(
        params_in = params.len(),
        params_out = out.len(),
        lists = expansions.len(),
        "normalized parameters"
    );

    PreparedQuery { sql, params: out }
}

/// True when every value can be bound as-is.
pub fn is_normalized(params: &ParameterStore) -> bool {
    params
        .iter()
        .all(|(_, v)| matches!(v, BindValue::Scalar(s) if !s.is_datetime()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use chrono::NaiveDate;

    #[test]
    fn list_parameter_is_split_into_numbered_placeholders() {
        let mut params = ParameterStore::new();
        params.insert("test1", vec![SqlValue::from("foo"), SqlValue::from("bar")]);
        let prepared = normalize("test IN (:test1)", &params);
        assert_eq!(prepared.sql, "test IN (:test11, :test12)");
        assert_eq!(
            prepared.params.get("test11"),
            Some(&BindValue::Scalar(SqlValue::from("foo")))
        );
        assert_eq!(
            prepared.params.get("test12"),
            Some(&BindValue::Scalar(SqlValue::from("bar")))
        );
        assert!(!prepared.params.contains("test1"));
    }

    #[test]
    fn datetime_is_formatted() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let mut params = ParameterStore::new();
        params.bind("since", dt);
        let prepared = normalize("created >= :since", &params);
        assert_eq!(prepared.sql, "created >= :since");
        assert_eq!(
            prepared.params.get("since"),
            Some(&BindValue::Scalar(SqlValue::from("2020-01-02 03:04:05")))
        );
        assert!(is_normalized(&prepared.params));
    }

    #[test]
    fn plain_parameters_are_left_unchanged() {
        let mut params = ParameterStore::new();
        params.bind("a", 1);
        params.bind("b", "x");
        let prepared = normalize("a = :a AND b = :b", &params);
        assert_eq!(prepared.sql, "a = :a AND b = :b");
        assert_eq!(prepared.params, params);
    }

    #[test]
    fn every_occurrence_is_rewritten_but_not_prefixes() {
        let mut params = ParameterStore::new();
        params.insert("t", vec![SqlValue::from(1), SqlValue::from(2)]);
        params.bind("t1x", 9);
        let prepared = normalize("a IN (:t) OR b IN (:t) OR c = :t1x", &params);
        assert_eq!(prepared.sql, "a IN (:t1, :t2) OR b IN (:t1, :t2) OR c = :t1x");
        assert_eq!(prepared.params.len(), 3);
    }

    #[test]
    fn expansion_avoids_existing_names() {
        let mut params = ParameterStore::new();
        params.bind("ids1", "taken");
        params.insert("ids", vec![SqlValue::from(7)]);
        let prepared = normalize("x = :ids1 AND y IN (:ids)", &params);
        assert_eq!(prepared.sql, "x = :ids1 AND y IN (:ids1__2)");
        assert_eq!(
            prepared.params.get("ids1__2"),
            Some(&BindValue::Scalar(SqlValue::Integer(7)))
        );
    }

    #[test]
    fn quotes_in_comments_and_identifiers_do_not_hide_lists() {
        let mut params = ParameterStore::new();
        params.insert("ids", vec![SqlValue::from(1), SqlValue::from(2)]);

        for sql in [
            "-- don't filter archived\nSELECT * FROM t WHERE id IN (:ids)",
            "SELECT /* owner's */ * FROM t WHERE id IN (:ids)",
            r#"SELECT "owner's" FROM t WHERE id IN (:ids)"#,
        ] {
            let prepared = normalize(sql, &params);
            assert!(prepared.sql.ends_with("id IN (:ids1, :ids2)"), "{}", prepared.sql);
            assert!(!prepared.params.contains("ids"));
            for name in crate::placeholder::placeholder_names(&prepared.sql) {
                assert!(prepared.params.contains(&name), "unbound {name}");
            }
        }
    }

    #[test]
    fn empty_list_becomes_null() {
        let mut params = ParameterStore::new();
        params.insert("none", Vec::<SqlValue>::new());
        let prepared = normalize("x IN (:none)", &params);
        assert_eq!(prepared.sql, "x IN (NULL)");
        assert!(prepared.params.is_empty());
    }
}
