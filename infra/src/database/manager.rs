//! Connection manager owning one pool per institutional database

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use wh_core::errors::{DatabaseError, DomainError, DomainResult};
use wh_core::services::retry::{with_retry, Attempted, RetryError, RetryPolicy};
use wh_shared::config::DatabaseConfigSummary;
use wh_shared::{DatabaseName, DatabaseSettings, Environment};

use super::health::{CloseSummary, ConnectionTestResult, ConnectionTestResults, DatabaseHealth};
use super::pool::{DatabasePool, QueryFailure, QueryRow, SqlParam};

/// Default per-attempt query timeout
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call query behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Bound on each attempt, not on the whole call
    pub timeout: Duration,
    pub retry_on_failure: bool,
    pub log_query: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            retry_on_failure: true,
            log_query: false,
        }
    }
}

impl QueryOptions {
    /// Defaults for a database: WISAKA and WISMON always log their queries,
    /// the others only in development.
    pub fn for_database(database: DatabaseName, environment: Environment) -> Self {
        Self {
            log_query: matches!(database, DatabaseName::Wisaka | DatabaseName::Wismon)
                || environment.is_development(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.retry_on_failure = false;
        self
    }

    pub fn with_logging(mut self, log_query: bool) -> Self {
        self.log_query = log_query;
        self
    }
}

/// Why one query attempt failed
#[derive(Debug)]
enum AttemptError {
    TimedOut,
    Failed(QueryFailure),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::TimedOut => false,
            AttemptError::Failed(failure) => failure.is_transient(),
        }
    }
}

/// Owns the five database pools
///
/// Built once at startup and shared through `Arc`; callers never see the
/// pools themselves.
pub struct ConnectionManager {
    pools: BTreeMap<DatabaseName, Arc<dyn DatabasePool>>,
    configurations: BTreeMap<DatabaseName, DatabaseConfigSummary>,
    environment: Environment,
    probe_policy: RetryPolicy,
}

impl ConnectionManager {
    pub fn new<I>(pools: I, environment: Environment) -> Self
    where
        I: IntoIterator<Item = (DatabaseName, Arc<dyn DatabasePool>)>,
    {
        Self {
            pools: pools.into_iter().collect(),
            configurations: BTreeMap::new(),
            environment,
            probe_policy: RetryPolicy::startup_probe(),
        }
    }

    /// Create lazily connecting MySQL pools for every configured database
    #[cfg(feature = "mysql")]
    pub fn connect(settings: &DatabaseSettings, environment: Environment) -> Self {
        use super::connection::MySqlDatabasePool;

        let pools = settings.iter().map(|config| {
            let pool: Arc<dyn DatabasePool> = Arc::new(MySqlDatabasePool::new(config));
            (config.name, pool)
        });

        Self::new(pools, environment).with_configurations(settings)
    }

    /// Remember the non-secret part of each configuration for diagnostics
    pub fn with_configurations(mut self, settings: &DatabaseSettings) -> Self {
        self.configurations = settings
            .iter()
            .map(|config| (config.name, config.summary()))
            .collect();
        self
    }

    pub fn with_probe_policy(mut self, policy: RetryPolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Host, port, database and limit per database; never credentials
    pub fn configurations(&self) -> &BTreeMap<DatabaseName, DatabaseConfigSummary> {
        &self.configurations
    }

    fn pool(&self, database: DatabaseName) -> DomainResult<&Arc<dyn DatabasePool>> {
        self.pools.get(&database).ok_or_else(|| DomainError::Internal {
            message: format!("No connection pool registered for {}", database),
        })
    }

    /// Probe every pool concurrently, retrying each probe with backoff
    pub async fn test_connections(&self) -> ConnectionTestResults {
        info!(
            max_attempts = self.probe_policy.max_attempts,
            "Starting database connection tests"
        );
        let started = Instant::now();

        let probes = self
            .pools
            .iter()
            .map(|(name, pool)| self.probe(*name, Arc::clone(pool)));
        let results: ConnectionTestResults = join_all(probes).await.into_iter().collect();

        let successful = results.successful();
        let total = results.total();
        info!(
            successful,
            total,
            total_time_ms = started.elapsed().as_millis() as u64,
            average_response_ms = results.average_response_time_ms(),
            "Database connection summary"
        );

        for (name, result) in results.iter().filter(|(_, r)| !r.success) {
            error!(
                database = %name,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Database unavailable"
            );
        }

        if results.all_succeeded() {
            info!("All database connections successful");
        } else {
            warn!("{}/{} database connections successful", successful, total);
        }

        results
    }

    async fn probe(
        &self,
        name: DatabaseName,
        pool: Arc<dyn DatabasePool>,
    ) -> (DatabaseName, ConnectionTestResult) {
        let max_attempts = self.probe_policy.max_attempts;

        let outcome = with_retry(
            &self.probe_policy,
            |attempt| {
                let pool = Arc::clone(&pool);
                async move {
                    debug!(database = %name, attempt, max_attempts, "Testing database connection");
                    let started = Instant::now();
                    match pool.ping().await {
                        Ok(()) => Ok(started.elapsed()),
                        Err(failure) => {
                            warn!(
                                database = %name,
                                attempt,
                                error = %failure,
                                "Database connection attempt failed"
                            );
                            if failure.is_tls_related() {
                                warn!(
                                    database = %name,
                                    "TLS handshake failed: set DB_REQUIRE_SSL=false or enable TLS on the MySQL server"
                                );
                            }
                            Err(failure)
                        }
                    }
                }
            },
            |_| true,
        )
        .await;

        let result = match outcome {
            Ok(Attempted {
                value: elapsed,
                attempts,
            }) => {
                let response_time_ms = elapsed.as_millis() as u64;
                info!(
                    database = %name,
                    response_time_ms,
                    attempts,
                    "Database connected successfully"
                );
                ConnectionTestResult::connected(response_time_ms, attempts)
            }
            Err(RetryError { error, attempts }) => {
                error!(
                    database = %name,
                    attempts,
                    error = %error,
                    "Database connection failed after all attempts"
                );
                ConnectionTestResult::failed(error.message, attempts)
            }
        };

        (name, result)
    }

    /// Run a query with the database's default options
    pub async fn execute(
        &self,
        database: DatabaseName,
        sql: &str,
        params: &[SqlParam],
    ) -> DomainResult<Vec<QueryRow>> {
        let options = QueryOptions::for_database(database, self.environment);
        self.execute_query(database, sql, params, options).await
    }

    /// Run a query with a per-attempt timeout, retrying transient
    /// connection failures with linear backoff
    pub async fn execute_query(
        &self,
        database: DatabaseName,
        sql: &str,
        params: &[SqlParam],
        options: QueryOptions,
    ) -> DomainResult<Vec<QueryRow>> {
        let pool = self.pool(database)?;
        let statement = compact_sql(sql);

        if options.log_query {
            info!(database = %database, query = %statement, "Executing query");
            debug!(database = %database, params = ?params, "Query parameters");
        }

        let policy = RetryPolicy::query(options.retry_on_failure);
        let outcome = with_retry(
            &policy,
            |attempt| {
                let pool = Arc::clone(pool);
                let statement = &statement;
                async move {
                    let started = Instant::now();
                    match tokio::time::timeout(options.timeout, pool.execute(sql, params)).await {
                        Ok(Ok(rows)) => Ok((rows, started.elapsed())),
                        Ok(Err(failure)) => {
                            error!(
                                database = %database,
                                attempt,
                                error = %failure,
                                code = failure.code.as_deref().unwrap_or("-"),
                                kind = %failure.kind,
                                query = %statement,
                                "Query error"
                            );
                            Err(AttemptError::Failed(failure))
                        }
                        Err(_) => {
                            error!(
                                database = %database,
                                attempt,
                                timeout_ms = options.timeout.as_millis() as u64,
                                query = %statement,
                                "Query timeout"
                            );
                            Err(AttemptError::TimedOut)
                        }
                    }
                }
            },
            AttemptError::is_retryable,
        )
        .await;

        match outcome {
            Ok(Attempted {
                value: (rows, elapsed),
                attempts,
            }) => {
                if options.log_query {
                    info!(
                        database = %database,
                        result_count = rows.len(),
                        execution_ms = elapsed.as_millis() as u64,
                        attempts,
                        "Query successful"
                    );
                }
                Ok(rows)
            }
            Err(RetryError { error, attempts }) => Err(query_error(database, error, attempts, options)),
        }
    }

    /// Re-probe every pool and report per-database status with pool occupancy
    pub async fn get_database_health(&self) -> DatabaseHealth {
        let results = self.test_connections().await;
        DatabaseHealth::from_results(&results, |name| {
            self.pools
                .get(&name)
                .map(|pool| pool.statistics())
                .unwrap_or_default()
        })
    }

    /// Close every pool concurrently; failures are logged, never returned
    pub async fn close_database_connections(&self) -> CloseSummary {
        info!("Closing database connections gracefully");

        let closes = self
            .pools
            .iter()
            .map(|(name, pool)| async move { (*name, pool.close().await) });

        let mut summary = CloseSummary::default();
        for (name, outcome) in join_all(closes).await {
            match outcome {
                Ok(()) => {
                    info!(database = %name, "Database pool closed");
                    summary.closed.push(name);
                }
                Err(failure) => {
                    error!(database = %name, error = %failure, "Error closing database pool");
                    summary.failed.push((name, failure.message));
                }
            }
        }

        if summary.is_clean() {
            info!("All database connections closed successfully");
        }
        summary
    }
}

fn query_error(
    database: DatabaseName,
    error: AttemptError,
    attempts: u32,
    options: QueryOptions,
) -> DomainError {
    let error = match error {
        AttemptError::TimedOut => DatabaseError::QueryTimeout {
            database,
            timeout_ms: options.timeout.as_millis() as u64,
            attempts,
        },
        AttemptError::Failed(failure) if failure.kind.is_connectivity() => {
            DatabaseError::Unreachable {
                database,
                attempts,
                message: failure.message,
            }
        }
        AttemptError::Failed(failure) => DatabaseError::QueryFailed {
            database,
            attempts,
            cause: failure.message,
            code: failure.code,
        },
    };
    error.into()
}

/// Collapse whitespace so multi-line statements log on one line
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
