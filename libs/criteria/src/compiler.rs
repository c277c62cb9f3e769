//! Criteria to SQL boolean fragment compiler.
//!
//! Compiles one field's [`Criterion`] into a fragment such as
//! `price > :price1 AND price < :price2` and fills the parameter store with
//! the values behind every placeholder it emits.
//!
//! Naming of bind parameters:
//! - a scalar binds under the field key itself (`:status`)
//! - each comparison of an operator chain gets `key` + a 1-based counter
//!   (`:price1`, `:price2`); markers do not advance the counter
//! - expanded lists bind one value per `key_<n>` (`:tag_1,:tag_2`)
//! - non-expanded lists bind the whole list under `key`, to be split later
//!   by [`crate::normalize`]

use crate::criteria::{ConditionEntry, Criteria, Criterion, Operator};
use crate::params::{NameAllocator, ParameterStore};
use crate::value::{BindValue, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaCompiler {
    operator: Operator,
    expand: bool,
}

impl Default for CriteriaCompiler {
    fn default() -> Self {
        Self {
            operator: Operator::Eq,
            expand: true,
        }
    }
}

impl CriteriaCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator applied to the top-level criterion (default `=`).
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// One placeholder per list value (`true`, default) or one for the whole list.
    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn expand(&self) -> bool {
        self.expand
    }

    /// Compile the entry stored under `key`.
    ///
    /// Returns `None` when `criteria` has no entry for `key`, meaning the
    /// field contributes no condition; `params` is left untouched then.
    pub fn compile(
        &self,
        field_sql: &str,
        criteria: &Criteria,
        key: &str,
        params: &mut ParameterStore,
    ) -> Option<String> {
        let Some(criterion) = criteria.get(key) else {
            tracing::trace!(key, "no criteria for field");
            return None;
        };
        self.compile_value(field_sql, criterion, key, params)
    }

    /// Compile a criterion directly, as if it were stored under `key`.
    pub fn compile_value(
        &self,
        field_sql: &str,
        criterion: &Criterion,
        key: &str,
        params: &mut ParameterStore,
    ) -> Option<String> {
        let mut ctx = CompileContext {
            names: NameAllocator::for_store(params),
            params,
            expand: self.expand,
        };
        let fragment = ctx.compile(field_sql, criterion, key, self.operator);
        tracing::debug!(
            field = field_sql,
            key,
            operator = %self.operator,
            expand = self.expand,
            fragment = fragment.as_deref().unwrap_or(""),
            "compiled criteria"
        );
        fragment
    }
}

/// Compile with the default `=` operator and expanded lists.
pub fn compile_criteria_where(
    field_sql: &str,
    criteria: &Criteria,
    key: &str,
    params: &mut ParameterStore,
) -> Option<String> {
    CriteriaCompiler::default().compile(field_sql, criteria, key, params)
}

struct CompileContext<'a> {
    params: &'a mut ParameterStore,
    names: NameAllocator,
    expand: bool,
}

impl CompileContext<'_> {
    fn compile(
        &mut self,
        field: &str,
        criterion: &Criterion,
        key: &str,
        operator: Operator,
    ) -> Option<String> {
        match criterion {
            Criterion::Null => Some(null_test(field, operator)),
            Criterion::Conditions(entries) => self.compile_conditions(field, entries, key),
            Criterion::List(values) => self.compile_list(field, values, key, operator),
            Criterion::Scalar(value) => Some(self.compile_scalar(field, value, key, operator)),
        }
    }

    fn compile_conditions(
        &mut self,
        field: &str,
        entries: &[ConditionEntry],
        key: &str,
    ) -> Option<String> {
        let mut i = 1usize;
        let mut parts = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                ConditionEntry::Conjunction(conj) => parts.push(conj.as_sql().to_string()),
                ConditionEntry::Comparison { operator, value } => {
                    let subkey = format!("{key}{i}");
                    i += 1;
                    if let Some(fragment) = self.compile(field, value, &subkey, *operator) {
                        parts.push(fragment);
                    }
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    fn compile_list(
        &mut self,
        field: &str,
        values: &[Option<SqlValue>],
        key: &str,
        operator: Operator,
    ) -> Option<String> {
        let is_null = values.iter().any(Option::is_none);
        let values: Vec<SqlValue> = values.iter().flatten().cloned().collect();
        let membership = if operator.is_negated() { "NOT IN" } else { "IN" };

        let mut parts = Vec::with_capacity(2);
        if !values.is_empty() {
            if self.expand {
                let mut placeholders = Vec::with_capacity(values.len());
                for (i, value) in values.into_iter().enumerate() {
                    let name = self.names.claim(&format!("{key}_{}", i + 1));
                    placeholders.push(format!(":{name}"));
                    self.params.insert(name, BindValue::Scalar(value));
                }
                parts.push(format!("{field} {membership} ({})", placeholders.join(",")));
            } else {
                let name = self.names.claim(key);
                parts.push(format!("{field} {membership} (:{name})"));
                self.params.insert(name, BindValue::List(values));
            }
        }
        if is_null {
            parts.push(null_test(field, operator));
        }

        if parts.is_empty() {
            return None;
        }
        let glue = if operator.is_negated() { " AND " } else { " OR " };
        Some(parts.join(glue))
    }

    fn compile_scalar(
        &mut self,
        field: &str,
        value: &SqlValue,
        key: &str,
        operator: Operator,
    ) -> String {
        let name = self.names.claim(key);
        self.params.insert(name.clone(), BindValue::Scalar(value.clone()));
        match operator {
            // A lone value under IN still needs the parenthesised list syntax.
            Operator::In | Operator::NotIn => format!("{field} {operator} (:{name})"),
            _ => format!("{field} {operator} :{name}"),
        }
    }
}

fn null_test(field: &str, operator: Operator) -> String {
    if operator.is_negated() {
        format!("{field} IS NOT NULL")
    } else {
        format!("{field} IS NULL")
    }
}
