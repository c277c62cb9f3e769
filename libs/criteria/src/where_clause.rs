//! WHERE clause assembly from several compiled fields.

use crate::compiler::CriteriaCompiler;
use crate::criteria::Criteria;
use crate::params::ParameterStore;

#[derive(Debug, Clone)]
struct Column {
    field_sql: String,
    key: String,
}

/// Compiles every known column present in a [`Criteria`] and ANDs the results.
///
/// ```
/// use eclectic_criteria::{Criteria, Criterion, Operator, ParameterStore, WhereBuilder};
///
/// let builder = WhereBuilder::new()
///     .column("u.status", "status")
///     .column("u.age", "age");
/// let criteria = Criteria::new()
///     .with("status", "active")
///     .with("age", Criterion::condition(Operator::Ge, 18));
/// let mut params = ParameterStore::new();
/// let sql = builder.build(&criteria, &mut params).unwrap();
/// assert_eq!(sql, "u.status = :status AND u.age >= :age1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct WhereBuilder {
    compiler: CriteriaCompiler,
    columns: Vec<Column>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: CriteriaCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Map a criteria key to the SQL expression it filters.
    pub fn column(mut self, field_sql: impl Into<String>, key: impl Into<String>) -> Self {
        self.columns.push(Column {
            field_sql: field_sql.into(),
            key: key.into(),
        });
        self
    }

    /// `None` when no column has criteria.
    pub fn build(&self, criteria: &Criteria, params: &mut ParameterStore) -> Option<String> {
        let mut parts = Vec::new();
        for column in &self.columns {
            if let Some(fragment) =
                self.compiler
                    .compile(&column.field_sql, criteria, &column.key, params)
            {
                parts.push(fragment);
            }
        }

        for (key, _) in criteria.iter() {
            if !self.columns.iter().any(|c| c.key == key) {
                tracing::warn!(key, "criteria key has no mapped column, ignoring");
            }
        }

        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(
                parts
                    .iter()
                    .map(|p| parenthesize(p))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }
}

/// Wrap fragments that contain a top-level boolean connective.
fn parenthesize(fragment: &str) -> String {
    if fragment.contains(" AND ") || fragment.contains(" OR ") {
        format!("({fragment})")
    } else {
        fragment.to_string()
    }
}
