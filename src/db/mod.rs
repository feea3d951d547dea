//! Database layer
//!
//! Storage for the devs service. Two backends are supported:
//! - SQLite (default, single-file deployment and in-memory tests)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. Everything above this layer
//! talks to the `DatabasePool` trait object and never to a concrete pool.
//!
//! # Usage
//!
//! ```ignore
//! use devs::config::DatabaseConfig;
//! use devs::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
