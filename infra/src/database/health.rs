//! Probe results, health reports and shutdown outcomes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use wh_shared::DatabaseName;

use super::pool::PoolStatistics;

/// Outcome of probing one database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    /// Last error once every attempt failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub attempts: u32,
}

impl ConnectionTestResult {
    pub fn connected(response_time_ms: u64, attempts: u32) -> Self {
        Self {
            success: true,
            error: None,
            response_time_ms: Some(response_time_ms),
            attempts,
        }
    }

    pub fn failed(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            response_time_ms: None,
            attempts,
        }
    }
}

/// Probe outcomes for every database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConnectionTestResults {
    results: BTreeMap<DatabaseName, ConnectionTestResult>,
}

impl ConnectionTestResults {
    pub fn get(&self, name: DatabaseName) -> Option<&ConnectionTestResult> {
        self.results.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatabaseName, &ConnectionTestResult)> {
        self.results.iter().map(|(name, result)| (*name, result))
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    /// Databases whose probe failed, in declaration order
    pub fn failed(&self) -> Vec<DatabaseName> {
        self.iter()
            .filter(|(_, result)| !result.success)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.successful() == self.total()
    }

    /// Mean response time over the successful probes
    pub fn average_response_time_ms(&self) -> Option<u64> {
        let times: Vec<u64> = self
            .results
            .values()
            .filter_map(|r| r.response_time_ms)
            .collect();
        if times.is_empty() {
            return None;
        }
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

impl FromIterator<(DatabaseName, ConnectionTestResult)> for ConnectionTestResults {
    fn from_iter<I: IntoIterator<Item = (DatabaseName, ConnectionTestResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

/// Overall health of the database layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// All connected is healthy, none is unhealthy, anything between degraded
    pub fn classify(connected: usize, total: usize) -> Self {
        if connected == 0 {
            HealthStatus::Unhealthy
        } else if connected >= total {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Health entry for one database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub status: ConnectionState,
    #[serde(rename = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pool_info: PoolStatistics,
}

/// Health report served by the monitoring endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub databases: BTreeMap<DatabaseName, DatabaseStatus>,
    pub timestamp: DateTime<Utc>,
}

impl DatabaseHealth {
    /// Combine fresh probe results with each pool's statistics
    pub fn from_results<F>(results: &ConnectionTestResults, statistics: F) -> Self
    where
        F: Fn(DatabaseName) -> PoolStatistics,
    {
        let databases = results
            .iter()
            .map(|(name, result)| {
                let status = DatabaseStatus {
                    status: if result.success {
                        ConnectionState::Connected
                    } else {
                        ConnectionState::Disconnected
                    },
                    response_time_ms: result.response_time_ms,
                    error: result.error.clone(),
                    pool_info: statistics(name),
                };
                (name, status)
            })
            .collect();

        Self {
            status: HealthStatus::classify(results.successful(), results.total()),
            databases,
            timestamp: Utc::now(),
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}

/// What happened when the pools were closed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSummary {
    pub closed: Vec<DatabaseName>,
    pub failed: Vec<(DatabaseName, String)>,
}

impl CloseSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
