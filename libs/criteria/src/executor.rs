//! Statement execution seam.
//!
//! [`execute_prepared`] is the last step of the pipeline: normalize the
//! named parameters, rewrite to positional placeholders, prepare, and run.
//! Backends implement [`QueryExecutor`]; a Postgres one ships behind the
//! `postgres` feature.

use crate::error::Result;
use crate::normalize::normalize;
use crate::params::ParameterStore;
use crate::positional::to_positional;
use crate::value::SqlValue;
use async_trait::async_trait;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Check that the statement is valid for the backend without running it.
    async fn prepare(&self, sql: &str) -> Result<()>;

    /// Run the statement with positional binds; returns affected rows.
    async fn execute(&self, sql: &str, binds: &[SqlValue]) -> Result<u64>;
}

/// Outcome of [`execute_prepared`].
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub binds: Vec<SqlValue>,
    /// `None` when only prepared.
    pub rows_affected: Option<u64>,
}

pub async fn execute_prepared<E>(
    executor: &E,
    sql: &str,
    params: &ParameterStore,
    execute: bool,
) -> Result<Execution>
where
    E: QueryExecutor + ?Sized,
{
    let prepared = normalize(sql, params);
    let (sql, binds) = to_positional(&prepared)?;

    executor.prepare(&sql).await?;

    let rows_affected = if execute {
        let rows = executor.execute(&sql, &binds).await?;
        tracing::debug!(rows, binds = binds.len(), "statement executed");
        Some(rows)
    } else {
        None
    };

    Ok(Execution {
        sql,
        binds,
        rows_affected,
    })
}

#[cfg(feature = "postgres")]
pub mod postgres {
    use super::QueryExecutor;
    use crate::error::Result;
    use crate::value::SqlValue;
    use async_trait::async_trait;
    use sqlx::postgres::{PgArguments, PgPool};
    use sqlx::query::Query;
    use sqlx::{Executor, Postgres};

    #[derive(Debug, Clone)]
    pub struct PgExecutor {
        pool: PgPool,
    }

    impl PgExecutor {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }
    }

    fn bind_value<'q>(
        query: Query<'q, Postgres, PgArguments>,
        value: &SqlValue,
    ) -> Query<'q, Postgres, PgArguments> {
        match value {
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::DateTime(dt) => query.bind(*dt),
        }
    }

    #[async_trait]
    impl QueryExecutor for PgExecutor {
        async fn prepare(&self, sql: &str) -> Result<()> {
            self.pool.prepare(sql).await?;
            Ok(())
        }

        async fn execute(&self, sql: &str, binds: &[SqlValue]) -> Result<u64> {
            let mut query = sqlx::query(sql);
            for value in binds {
                query = bind_value(query, value);
            }
            let result = query.execute(&self.pool).await?;
            Ok(result.rows_affected())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        prepared: Mutex<Vec<String>>,
        executed: Mutex<Vec<(String, Vec<SqlValue>)>>,
    }

    #[async_trait]
    impl QueryExecutor for Recorder {
        async fn prepare(&self, sql: &str) -> Result<()> {
            self.prepared.lock().unwrap().push(sql.to_string());
            Ok(())
        }

        async fn execute(&self, sql: &str, binds: &[SqlValue]) -> Result<u64> {
            self.executed
                .lock()
                .unwrap()
                .push((sql.to_string(), binds.to_vec()));
            Ok(binds.len() as u64)
        }
    }

    #[tokio::test]
    async fn normalizes_and_executes() {
        let mut params = ParameterStore::new();
        params.insert("ids", vec![SqlValue::from(4), SqlValue::from(5)]);
        params.bind("state", "open");
        let recorder = Recorder::default();

        let run = execute_prepared(
            &recorder,
            "UPDATE t SET state = :state WHERE id IN (:ids)",
            &params,
            true,
        )
        .await
        .unwrap();

        assert_eq!(run.sql, "UPDATE t SET state = $1 WHERE id IN ($2, $3)");
        assert_eq!(run.rows_affected, Some(3));
        assert_eq!(recorder.prepared.lock().unwrap().len(), 1);
        assert_eq!(recorder.executed.lock().unwrap()[0].1.len(), 3);
    }

    #[tokio::test]
    async fn prepare_only_skips_execution() {
        let recorder = Recorder::default();
        let run = execute_prepared(&recorder, "SELECT 1", &ParameterStore::new(), false)
            .await
            .unwrap();
        assert_eq!(run.rows_affected, None);
        assert!(recorder.executed.lock().unwrap().is_empty());
    }
}
