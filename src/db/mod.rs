//! Database module
//!
//! Handles SQLite connection, migrations and row coercion.

pub mod coerce;
pub mod connection;
pub mod migrations;

pub use connection::{run_in_transaction, Database, DbError, DbResult};
