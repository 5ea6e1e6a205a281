//! Shared domain types for the lookout status registry.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health classification of a monitored adapter.
///
/// Serializes as the lowercase word the dashboard expects
/// (`"healthy"`, `"warning"`, `"error"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterHealth {
    #[default]
    Healthy,
    Warning,
    Error,
}

impl AdapterHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterHealth::Healthy => "healthy",
            AdapterHealth::Warning => "warning",
            AdapterHealth::Error => "error",
        }
    }
}

impl fmt::Display for AdapterHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health and traffic counters for one monitored adapter.
///
/// A latency of zero means the adapter never answered; the read side
/// renders it as `"timeout"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRecord {
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub requests: u64,
    pub errors: u64,
}

impl AdapterRecord {
    pub fn new(status: AdapterHealth, latency_ms: u64, requests: u64, errors: u64) -> Self {
        Self {
            status,
            latency_ms,
            requests,
            errors,
        }
    }
}

/// Immutable point-in-time copy of the registry state.
///
/// Taken under the registry's read lock and then owned by the caller, so
/// no lock is held while a response is shaped or serialized.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    pub is_running: bool,
    /// Wall-clock start of the current uptime epoch, for display.
    pub started_at: DateTime<Utc>,
    /// Time since the last (re)start, from the monotonic clock.
    pub uptime: Duration,
    pub total_requests: u64,
    pub total_errors: u64,
    pub adapters: BTreeMap<String, AdapterRecord>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_health_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AdapterHealth::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&AdapterHealth::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(
            serde_json::to_string(&AdapterHealth::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_adapter_health_round_trips_display() {
        for health in [
            AdapterHealth::Healthy,
            AdapterHealth::Warning,
            AdapterHealth::Error,
        ] {
            let json = format!("\"{health}\"");
            let parsed: AdapterHealth = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, health);
        }
    }
}
