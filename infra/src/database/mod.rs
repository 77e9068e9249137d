//! Database module - pools and the connection manager
//!
//! This module provides the database access layer:
//! - The `DatabasePool` seam and its sqlx MySQL implementation
//! - The `ConnectionManager` owning one pool per institutional database
//! - Connection probes, health reporting and startup evaluation
//! - Repository implementations backed by the manager

pub mod health;
pub mod manager;
pub mod pool;
pub mod startup;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(feature = "mysql")]
pub mod connection;
#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use health::{
    CloseSummary, ConnectionState, ConnectionTestResult, ConnectionTestResults, DatabaseHealth,
    DatabaseStatus, HealthStatus,
};
pub use manager::{ConnectionManager, QueryOptions};
pub use pool::{
    DatabasePool, FailureKind, PoolStatistics, QueryFailure, QueryRow, SqlParam, PROBE_QUERY,
    TRANSIENT_FAILURES,
};
pub use startup::{evaluate_startup, StartupDecision};

#[cfg(feature = "mysql")]
pub use connection::MySqlDatabasePool;
#[cfg(feature = "mysql")]
pub use mysql::MySqlStudentRepository;
