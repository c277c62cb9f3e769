//! Error types for criteria ingestion and query preparation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CriteriaError>;

#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("unknown comparison operator '{0}'")]
    UnknownOperator(String),

    #[error("list criteria for '{0}' may only contain scalars or null")]
    NestedList(String),

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("invalid date/time '{0}' (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidDateTime(String),

    #[error("placeholder ':{0}' has no bound parameter")]
    UnboundPlaceholder(String),

    #[error("statement execution failed: {0}")]
    Execution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for CriteriaError {
    fn from(err: sqlx::Error) -> Self {
        Self::Execution(err.to_string())
    }
}
