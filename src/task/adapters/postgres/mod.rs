//! `PostgreSQL` adapter for queue snapshot persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresSnapshotStore, SnapshotPgPool};
