pub mod compose;
pub mod resolver;
pub mod schema;

pub use schema::{build_schema, ApiSchema};
