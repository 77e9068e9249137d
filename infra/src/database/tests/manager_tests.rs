//! Unit tests for the connection manager

use std::time::Duration;

use tokio::time::Instant;
use wh_core::errors::{DatabaseError, DomainError};
use wh_shared::{DatabaseName, Environment};

use super::manager_with;
use crate::database::manager::{ConnectionManager, QueryOptions};
use crate::database::pool::{FailureKind, QueryFailure, QueryRow, SqlParam};
use crate::database::testing::{ScriptedPool, Step};

fn reset() -> QueryFailure {
    QueryFailure::new(FailureKind::ConnectionReset, "read ECONNRESET").with_code("ECONNRESET")
}

fn syntax_error() -> QueryFailure {
    QueryFailure::new(
        FailureKind::Server,
        "You have an error in your SQL syntax near 'FORM mahasiswa'",
    )
    .with_code("42000")
}

fn student_row() -> QueryRow {
    let mut row = QueryRow::new();
    row.insert("nrm".to_string(), "2021-001".into());
    row
}

#[tokio::test(start_paused = true)]
async fn test_all_databases_connect() {
    let (manager, pools) = manager_with(vec![]);

    let results = manager.test_connections().await;

    assert_eq!(results.total(), 5);
    assert!(results.all_succeeded());
    for (_, result) in results.iter() {
        assert_eq!(result.attempts, 1);
        assert!(result.response_time_ms.is_some());
        assert!(result.error.is_none());
    }
    assert!(pools.values().all(|pool| pool.calls() == 1));
}

#[tokio::test(start_paused = true)]
async fn test_probe_recovers_on_third_attempt() {
    let flaky = ScriptedPool::healthy()
        .then(Step::Fail(QueryFailure::new(FailureKind::ConnectionRefused, "connect ECONNREFUSED")))
        .then(Step::Fail(QueryFailure::new(FailureKind::ConnectionRefused, "connect ECONNREFUSED")));
    let (manager, pools) = manager_with(vec![(DatabaseName::Wisaka, flaky)]);
    let started = Instant::now();

    let results = manager.test_connections().await;

    let wisaka = results.get(DatabaseName::Wisaka).unwrap();
    assert!(wisaka.success);
    assert_eq!(wisaka.attempts, 3);
    assert_eq!(pools[&DatabaseName::Wisaka].calls(), 3);

    // 1000ms then 3000ms, each with under 200ms of jitter
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(4000));
    assert!(waited < Duration::from_millis(4400));
}

#[tokio::test(start_paused = true)]
async fn test_probe_exhaustion_reports_last_error() {
    let (manager, pools) = manager_with(vec![(DatabaseName::Perpustakaan, ScriptedPool::unreachable())]);

    let results = manager.test_connections().await;

    let perpustakaan = results.get(DatabaseName::Perpustakaan).unwrap();
    assert!(!perpustakaan.success);
    assert_eq!(perpustakaan.attempts, 3);
    assert_eq!(perpustakaan.error.as_deref(), Some("connect ECONNREFUSED"));
    assert_eq!(perpustakaan.response_time_ms, None);
    assert_eq!(pools[&DatabaseName::Perpustakaan].calls(), 3);
    assert_eq!(results.successful(), 4);
    assert_eq!(results.failed(), vec![DatabaseName::Perpustakaan]);
}

#[tokio::test(start_paused = true)]
async fn test_probes_run_concurrently() {
    let (manager, pools) = manager_with(vec![
        (DatabaseName::Wis, ScriptedPool::unreachable()),
        (DatabaseName::Wisaka, ScriptedPool::unreachable()),
        (DatabaseName::Perpustakaan, ScriptedPool::unreachable()),
    ]);
    let started = Instant::now();

    let results = manager.test_connections().await;

    assert_eq!(results.successful(), 2);
    for name in [DatabaseName::Wis, DatabaseName::Wisaka, DatabaseName::Perpustakaan] {
        assert_eq!(results.get(name).unwrap().attempts, 3);
        assert_eq!(pools[&name].calls(), 3);
    }

    // One exhausted probe waits about 4s; three in sequence would take 12s
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(4000));
    assert!(waited < Duration::from_millis(4400));
}

#[tokio::test(start_paused = true)]
async fn test_query_retries_transient_failure_once() {
    let pool = ScriptedPool::returning(vec![student_row()]).then(Step::Fail(reset()));
    let (manager, pools) = manager_with(vec![(DatabaseName::Wis, pool)]);
    let started = Instant::now();

    let rows = manager
        .execute_query(
            DatabaseName::Wis,
            "SELECT nrm FROM mahasiswa WHERE nrm = ?",
            &[SqlParam::from("2021-001")],
            QueryOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(rows, vec![student_row()]);
    assert_eq!(pools[&DatabaseName::Wis].calls(), 2);
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_query_gives_up_after_two_transient_failures() {
    let (manager, pools) = manager_with(vec![(DatabaseName::Wis, ScriptedPool::failing(reset()))]);

    let err = manager
        .execute_query(DatabaseName::Wis, "SELECT 1", &[], QueryOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::Database(DatabaseError::QueryFailed {
            database: DatabaseName::Wis,
            attempts: 2,
            cause: "read ECONNRESET".to_string(),
            code: Some("ECONNRESET".to_string()),
        })
    );
    assert_eq!(
        err.to_string(),
        "WIS Database query failed after 2 attempts: read ECONNRESET"
    );
    assert_eq!(pools[&DatabaseName::Wis].calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_are_not_retried() {
    let (manager, pools) = manager_with(vec![(DatabaseName::Sso, ScriptedPool::failing(syntax_error()))]);
    let started = Instant::now();

    let err = manager
        .execute_query(DatabaseName::Sso, "SELECT * FORM mahasiswa", &[], QueryOptions::default())
        .await
        .unwrap_err();

    match err {
        DomainError::Database(DatabaseError::QueryFailed { attempts, code, .. }) => {
            assert_eq!(attempts, 1);
            assert_eq!(code.as_deref(), Some("42000"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(pools[&DatabaseName::Sso].calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_retry_can_be_disabled() {
    let (manager, pools) = manager_with(vec![(DatabaseName::Wismon, ScriptedPool::failing(reset()))]);

    let err = manager
        .execute_query(
            DatabaseName::Wismon,
            "SELECT 1",
            &[],
            QueryOptions::default().without_retry(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Database(DatabaseError::QueryFailed { attempts: 1, .. })
    ));
    assert_eq!(pools[&DatabaseName::Wismon].calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_query_timeout_is_not_retried() {
    let (manager, pools) = manager_with(vec![(DatabaseName::Wisaka, ScriptedPool::hanging())]);
    let started = Instant::now();

    let err = manager
        .execute_query(
            DatabaseName::Wisaka,
            "SELECT SLEEP(60)",
            &[],
            QueryOptions::default().with_timeout(Duration::from_millis(250)),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::Database(DatabaseError::QueryTimeout {
            database: DatabaseName::Wisaka,
            timeout_ms: 250,
            attempts: 1,
        })
    );
    assert_eq!(err.reason(), "database_timeout");
    assert_eq!(pools[&DatabaseName::Wisaka].calls(), 1);
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_is_unreachable() {
    let (manager, _) = manager_with(vec![(DatabaseName::Wis, ScriptedPool::unreachable())]);

    let err = manager
        .execute(DatabaseName::Wis, "SELECT 1", &[])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Database(DatabaseError::Unreachable {
            database: DatabaseName::Wis,
            attempts: 1,
            ..
        })
    ));
    assert_eq!(err.reason(), "database_unreachable");
}

#[tokio::test]
async fn test_unregistered_database_is_internal_error() {
    let manager = ConnectionManager::new(Vec::new(), Environment::Development);

    let err = manager
        .execute(DatabaseName::Sso, "SELECT 1", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Internal { .. }));
}

#[tokio::test]
async fn test_close_settles_every_pool() {
    let failing_close = ScriptedPool::healthy()
        .with_close_failure(QueryFailure::new(FailureKind::Other, "socket already closed"));
    let (manager, pools) = manager_with(vec![(DatabaseName::Wisaka, failing_close)]);

    let summary = manager.close_database_connections().await;

    assert!(!summary.is_clean());
    assert_eq!(summary.closed.len(), 4);
    assert_eq!(
        summary.failed,
        vec![(DatabaseName::Wisaka, "socket already closed".to_string())]
    );
    assert!(pools.values().all(|pool| pool.is_closed()));

    let err = manager
        .execute(DatabaseName::Sso, "SELECT 1", &[])
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "database_unreachable");
}

#[test]
fn test_query_options_per_database() {
    let production = Environment::Production;
    assert!(QueryOptions::for_database(DatabaseName::Wisaka, production).log_query);
    assert!(QueryOptions::for_database(DatabaseName::Wismon, production).log_query);
    assert!(!QueryOptions::for_database(DatabaseName::Wis, production).log_query);
    assert!(QueryOptions::for_database(DatabaseName::Wis, Environment::Development).log_query);

    let options = QueryOptions::for_database(DatabaseName::Sso, production);
    assert_eq!(options.timeout, Duration::from_secs(30));
    assert!(options.retry_on_failure);
}
