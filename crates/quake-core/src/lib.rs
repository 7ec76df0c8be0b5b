pub mod error;
pub mod params;
pub mod result;
pub mod schema;
pub mod types;

pub use error::{QuakeError, Result};
pub use params::QueryParameters;
pub use result::{RequestOutcome, ResultSet, Row, ScalarValue};
pub use schema::{Field, Schema};
pub use types::*;
