//! Storage module.
//!
//! Row models, SQL text, the abstract store interface the import pipeline
//! runs against, and its SQLite implementation.

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use models::*;
pub use queries::*;
pub use sqlite::*;
pub use store::*;
