//! sqlx-backed MySQL pool

use std::io::ErrorKind;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow,
    MySqlSslMode,
};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo};
use tracing::{info, warn};

use wh_shared::{DatabaseConfig, DatabaseName, TlsConfig};

use super::pool::{DatabasePool, FailureKind, PoolStatistics, QueryFailure, QueryRow, SqlParam};

/// Database connection pool wrapper for one MySQL database
pub struct MySqlDatabasePool {
    name: DatabaseName,
    pool: MySqlPool,
    max_connections: u32,
    /// Callers currently waiting for a connection
    waiting: AtomicU32,
}

impl MySqlDatabasePool {
    /// Create a lazily connecting pool
    ///
    /// No connection is opened here; the first probe or query does that.
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &DatabaseConfig) -> Self {
        let name = config.name;
        let pool = MySqlPoolOptions::new()
            .max_connections(config.connection_limit)
            .min_connections(0)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .after_connect(move |_connection, _meta| {
                Box::pin(async move {
                    info!(database = %name, "New database connection established");
                    Ok::<(), sqlx::Error>(())
                })
            })
            .connect_lazy_with(Self::connect_options(config));

        info!(
            database = %name,
            host = %config.host,
            port = config.port,
            max_connections = config.connection_limit,
            ssl = config.tls.is_some(),
            "Database pool created"
        );

        Self {
            name,
            pool,
            max_connections: config.connection_limit,
            waiting: AtomicU32::new(0),
        }
    }

    /// Connection options for a database
    ///
    /// TLS is off unless the configuration carries a TLS section.
    pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
        let ssl_mode = ssl_mode(config.tls.as_ref());

        MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset(&config.charset)
            .timezone(Some(config.timezone.clone()))
            .ssl_mode(ssl_mode)
    }

    /// Get a reference to the underlying sqlx pool
    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn failure(&self, error: sqlx::Error) -> QueryFailure {
        let failure = classify_error(&error);
        if failure.kind == FailureKind::ConnectionLost {
            warn!(
                database = %self.name,
                error = %failure,
                "Database connection lost, the pool will open a new one"
            );
        }
        failure
    }
}

#[async_trait]
impl DatabasePool for MySqlDatabasePool {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<QueryRow>, QueryFailure> {
        let mut connection = {
            let _waiting = WaitingGuard::enter(&self.waiting);
            self.pool.acquire().await.map_err(|e| self.failure(e))?
        };

        let query = params.iter().fold(sqlx::query(sql), bind_param);
        let rows = query
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| self.failure(e))?;

        rows.iter()
            .map(row_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.failure(e))
    }

    async fn close(&self) -> Result<(), QueryFailure> {
        self.pool.close().await;
        Ok(())
    }

    fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            total_connections: self.pool.size(),
            idle_connections: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            queued_requests: self.waiting.load(Ordering::Relaxed),
            max_connections: self.max_connections,
        }
    }
}

/// Counts a caller as queued until the guard drops
struct WaitingGuard<'a>(&'a AtomicU32);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicU32) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

fn bind_param<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Null => query.bind(Option::<String>::None),
        SqlParam::Bool(value) => query.bind(*value),
        SqlParam::Int(value) => query.bind(*value),
        SqlParam::Float(value) => query.bind(*value),
        SqlParam::Text(value) => query.bind(value.as_str()),
    }
}

/// TLS mode for a database: off without `DB_REQUIRE_SSL`, verified unless
/// `DB_SSL_REJECT_UNAUTHORIZED=false`
pub fn ssl_mode(tls: Option<&TlsConfig>) -> MySqlSslMode {
    match tls {
        None => MySqlSslMode::Disabled,
        Some(tls) if tls.verify_certificate => MySqlSslMode::VerifyIdentity,
        Some(_) => MySqlSslMode::Required,
    }
}

/// Map a driver error onto the pool-level failure kinds
pub fn classify_error(error: &sqlx::Error) -> QueryFailure {
    let message = error.to_string();
    match error {
        sqlx::Error::Io(io) => match io.kind() {
            ErrorKind::ConnectionReset => {
                QueryFailure::new(FailureKind::ConnectionReset, message).with_code("ECONNRESET")
            }
            ErrorKind::TimedOut => {
                QueryFailure::new(FailureKind::ConnectionTimedOut, message).with_code("ETIMEDOUT")
            }
            ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe | ErrorKind::ConnectionAborted => {
                QueryFailure::new(FailureKind::ConnectionLost, message)
                    .with_code("PROTOCOL_CONNECTION_LOST")
            }
            ErrorKind::ConnectionRefused => {
                QueryFailure::new(FailureKind::ConnectionRefused, message)
                    .with_code("ECONNREFUSED")
            }
            _ => QueryFailure::new(FailureKind::Other, message),
        },
        sqlx::Error::PoolTimedOut => {
            QueryFailure::new(FailureKind::ConnectionTimedOut, message).with_code("ETIMEDOUT")
        }
        sqlx::Error::PoolClosed => QueryFailure::new(FailureKind::PoolClosed, message),
        sqlx::Error::Tls(_) => QueryFailure::new(FailureKind::Tls, message),
        sqlx::Error::Database(db) => {
            let failure = QueryFailure::new(FailureKind::Server, message);
            match db.code() {
                Some(code) => failure.with_code(code.into_owned()),
                None => failure,
            }
        }
        _ => QueryFailure::new(FailureKind::Other, message),
    }
}

/// Convert a row into a JSON object keyed by column name
fn row_to_json(row: &MySqlRow) -> Result<QueryRow, sqlx::Error> {
    let mut object = QueryRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = column_value(row, index, column.type_info().name())?;
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn column_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "NULL" => None,
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index)?.map(Value::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index)?.map(Value::from),
        "YEAR" => row.try_get_unchecked::<Option<u16>, _>(index)?.map(Value::from),
        "FLOAT" | "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| Value::from(d.to_string())),
        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|d| Value::from(d.format("%Y-%m-%dT%H:%M:%S").to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|d| Value::from(d.to_rfc3339())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|t| Value::from(t.to_string())),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned())),
        // DECIMAL, JSON, ENUM and the text types arrive as strings
        _ => row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(Value::from),
    };
    Ok(value.unwrap_or(Value::Null))
}
