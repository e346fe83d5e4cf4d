//! askdb storage crate - read-only SQLite access for generated queries.
//!
//! Provides connection-string parsing, a read-only database handle, schema
//! reflection, the guarded query executor, and the process-wide registry
//! that swaps connection and schema together on reconfiguration.

pub mod connection;
pub mod db;
pub mod executor;
pub mod reflector;
pub mod registry;

pub use connection::DatabaseTarget;
pub use db::{CancelFlag, Database};
pub use executor::QueryExecutor;
pub use reflector::SchemaReflector;
pub use registry::{DatabaseRegistry, DatabaseSnapshot};
