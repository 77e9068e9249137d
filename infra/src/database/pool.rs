//! The pool seam the connection manager talks to

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

/// Statement used to probe a pool
pub const PROBE_QUERY: &str = "SELECT 1 as test";

/// Failure kinds a query may be retried on
pub const TRANSIENT_FAILURES: [FailureKind; 3] = [
    FailureKind::ConnectionReset,
    FailureKind::ConnectionTimedOut,
    FailureKind::ConnectionLost,
];

/// One result row, keyed by column name
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// A positional `?` parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Int(value.into())
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlParam::Null)
    }
}

/// Driver-independent classification of a failed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ConnectionReset,
    ConnectionTimedOut,
    /// The server closed the connection mid-protocol
    ConnectionLost,
    ConnectionRefused,
    /// The server answered with an error (syntax, constraint, permissions)
    Server,
    PoolClosed,
    Tls,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectionReset => "connection-reset",
            FailureKind::ConnectionTimedOut => "connection-timed-out",
            FailureKind::ConnectionLost => "protocol-connection-lost",
            FailureKind::ConnectionRefused => "connection-refused",
            FailureKind::Server => "server",
            FailureKind::PoolClosed => "pool-closed",
            FailureKind::Tls => "tls",
            FailureKind::Other => "other",
        }
    }

    pub fn is_transient(&self) -> bool {
        TRANSIENT_FAILURES.contains(self)
    }

    /// No connection could be obtained at all
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            FailureKind::ConnectionRefused | FailureKind::PoolClosed | FailureKind::Tls
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed statement as reported by a pool
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryFailure {
    pub kind: FailureKind,
    /// Driver or server code, e.g. `ECONNRESET` or a SQLSTATE
    pub code: Option<String>,
    pub message: String,
}

impl QueryFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// True for TLS handshake problems, which get a configuration hint
    pub fn is_tls_related(&self) -> bool {
        self.kind == FailureKind::Tls
            || ["secure connection", "SSL", "TLS"]
                .iter()
                .any(|needle| self.message.contains(needle))
    }
}

/// Pool occupancy snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatistics {
    pub total_connections: u32,
    pub idle_connections: u32,
    pub queued_requests: u32,
    pub max_connections: u32,
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool Stats: {}/{} connections ({} idle, {} queued)",
            self.total_connections,
            self.max_connections,
            self.idle_connections,
            self.queued_requests
        )
    }
}

/// A bounded connection pool for one database
///
/// Connections are acquired per call and returned when the call finishes
/// or its future is dropped.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run one statement with positional parameters
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<QueryRow>, QueryFailure>;

    /// Stop handing out connections and close the idle ones
    async fn close(&self) -> Result<(), QueryFailure>;

    fn statistics(&self) -> PoolStatistics;

    /// Acquire a connection and run the probe statement
    async fn ping(&self) -> Result<(), QueryFailure> {
        self.execute(PROBE_QUERY, &[]).await.map(|_| ())
    }
}
