//! Database layer
//!
//! Trait-based abstraction over the backing store. SQLite is the default
//! (single-binary deployment); MySQL is supported for larger deployments.
//! The driver is selected from configuration, which the `DATABASE_URL`
//! environment variable overrides.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
