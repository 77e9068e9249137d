//! # Infrastructure Layer
//!
//! Concrete database access for the Wirahusada backend. One MySQL pool per
//! institutional database (SSO, WIS, WISAKA, WISMON, PERPUSTAKAAN) sits
//! behind the [`database::DatabasePool`] trait, and the
//! [`database::ConnectionManager`] owns all five of them.
//!
//! ## Features
//!
//! - `mysql`: sqlx-backed pools and the MySQL student repository (default)
//! - `testing`: the `database::testing::ScriptedPool` double for other crates' tests

// Re-export core types for convenience
pub use wh_core::errors::*;

/// Database module - pools, connection manager, health and repositories
pub mod database;

pub use database::{
    evaluate_startup, ConnectionManager, ConnectionTestResult, ConnectionTestResults,
    DatabaseHealth, DatabasePool, HealthStatus, QueryOptions, StartupDecision,
};

#[cfg(feature = "mysql")]
pub use database::{MySqlDatabasePool, MySqlStudentRepository};
