//! Query execution for seismic range queries
//!
//! [`EventQueryExecutor`] answers the magnitude-range query against a
//! [`DataSource`]; [`CachedQueryExecutor`] puts the result cache in front of
//! any [`QueryExecutor`].

pub mod cached_executor;
pub mod executor;
pub mod operators;
pub mod source;

pub use cached_executor::CachedQueryExecutor;
pub use executor::{EventQueryExecutor, QueryExecutor};
pub use source::DataSource;
