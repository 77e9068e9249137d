//! Scripted pool doubles for exercising the manager without MySQL

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::pool::{DatabasePool, FailureKind, PoolStatistics, QueryFailure, QueryRow, SqlParam};

/// What a scripted pool does for one call
#[derive(Debug, Clone)]
pub enum Step {
    Rows(Vec<QueryRow>),
    Fail(QueryFailure),
    /// Never completes
    Hang,
}

/// A pool that replays scripted steps, then falls back to a fixed step
pub struct ScriptedPool {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    close_failure: Option<QueryFailure>,
    statistics: PoolStatistics,
    calls: AtomicU32,
    closed: AtomicBool,
}

impl ScriptedPool {
    fn with_fallback(fallback: Step) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            close_failure: None,
            statistics: PoolStatistics {
                max_connections: 15,
                ..PoolStatistics::default()
            },
            calls: AtomicU32::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Answers every statement with a single `{"test": 1}` row
    pub fn healthy() -> Self {
        let mut row = QueryRow::new();
        row.insert("test".to_string(), 1.into());
        Self::with_fallback(Step::Rows(vec![row]))
    }

    /// Answers every statement with the given rows
    pub fn returning(rows: Vec<QueryRow>) -> Self {
        Self::with_fallback(Step::Rows(rows))
    }

    /// Fails every statement
    pub fn failing(failure: QueryFailure) -> Self {
        Self::with_fallback(Step::Fail(failure))
    }

    /// Refuses every connection
    pub fn unreachable() -> Self {
        Self::failing(
            QueryFailure::new(FailureKind::ConnectionRefused, "connect ECONNREFUSED")
                .with_code("ECONNREFUSED"),
        )
    }

    /// Never answers
    pub fn hanging() -> Self {
        Self::with_fallback(Step::Hang)
    }

    /// Play `step` before the fallback; steps run in the order added
    pub fn then(self, step: Step) -> Self {
        self.queue().push_back(step);
        self
    }

    pub fn with_close_failure(mut self, failure: QueryFailure) -> Self {
        self.close_failure = Some(failure);
        self
    }

    pub fn with_statistics(mut self, statistics: PoolStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Statements executed so far, probes included
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Step>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DatabasePool for ScriptedPool {
    async fn execute(&self, _sql: &str, _params: &[SqlParam]) -> Result<Vec<QueryRow>, QueryFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_closed() {
            return Err(QueryFailure::new(
                FailureKind::PoolClosed,
                "attempted to acquire a connection on a closed pool",
            ));
        }

        let step = self.queue().pop_front().unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Rows(rows) => Ok(rows),
            Step::Fail(failure) => Err(failure),
            Step::Hang => std::future::pending().await,
        }
    }

    async fn close(&self) -> Result<(), QueryFailure> {
        self.closed.store(true, Ordering::SeqCst);
        match &self.close_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn statistics(&self) -> PoolStatistics {
        self.statistics
    }
}
