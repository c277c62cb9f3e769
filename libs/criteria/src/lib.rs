//! Criteria compiler
//!
//! Turns a per-field filter description into SQL WHERE fragments with named
//! bind parameters:
//! - [`CriteriaCompiler`] compiles one field (`price > :price1 AND price < :price2`)
//! - [`WhereBuilder`] ANDs the fragments of several mapped columns
//! - [`normalize()`] makes date/time and list parameters bindable
//! - [`to_positional`] / [`execute_prepared`] hand the result to a driver

#![forbid(unsafe_code)]

pub mod compiler;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod json;
pub mod normalize;
pub mod params;
pub mod placeholder;
pub mod positional;
pub mod value;
pub mod where_clause;

pub use compiler::{compile_criteria_where, CriteriaCompiler};
pub use criteria::{ConditionEntry, Conjunction, Criteria, Criterion, Operator};
pub use error::{CriteriaError, Result};
pub use executor::{execute_prepared, Execution, QueryExecutor};
pub use json::{
    criteria_for_key, criteria_from_json, criteria_from_str, params_from_json, params_from_str,
    JsonOptions,
};
pub use normalize::{normalize, PreparedQuery};
pub use params::{NameAllocator, ParameterStore};
pub use positional::to_positional;
pub use value::{BindValue, SqlValue, DATETIME_FORMAT};
pub use where_clause::WhereBuilder;
