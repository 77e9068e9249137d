//! Startup decision from the initial connection probes

use wh_shared::{DatabaseName, StartupPolicy};

use super::health::ConnectionTestResults;

/// Whether the server may start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupDecision {
    /// Every database answered
    Ready,
    /// Only non-essential databases are down
    Degraded { unavailable: Vec<DatabaseName> },
    Abort { reason: String },
}

impl StartupDecision {
    pub fn can_start(&self) -> bool {
        !matches!(self, StartupDecision::Abort { .. })
    }
}

/// Decide whether to start from the probe results
///
/// Nothing reachable aborts regardless of the essential list; otherwise
/// any essential database down aborts.
pub fn evaluate_startup(results: &ConnectionTestResults, policy: &StartupPolicy) -> StartupDecision {
    if results.total() == 0 || results.successful() == 0 {
        return StartupDecision::Abort {
            reason: "Critical failure: No database connections could be established".to_string(),
        };
    }

    let unavailable = results.failed();
    let essential_down: Vec<String> = unavailable
        .iter()
        .filter(|name| policy.is_essential(**name))
        .map(|name| name.as_str().to_string())
        .collect();

    if !essential_down.is_empty() {
        return StartupDecision::Abort {
            reason: format!(
                "Cannot start server - essential databases failed: {}",
                essential_down.join(", ")
            ),
        };
    }

    if unavailable.is_empty() {
        StartupDecision::Ready
    } else {
        StartupDecision::Degraded { unavailable }
    }
}
