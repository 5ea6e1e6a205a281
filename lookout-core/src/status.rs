//! Derived status views over the metrics registry.
//!
//! The aggregator is the read side of the system: each call takes one
//! fresh snapshot, performs the registry's request bookkeeping exactly
//! once, and shapes a response-ready view. It never writes anything
//! back into the adapter records; telemetry jitter stays in the
//! telemetry source.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::registry::MetricsRegistry;
use crate::telemetry::{SystemTelemetry, TelemetrySource};
use crate::types::AdapterHealth;

/// Version string reported by the health view.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Liveness view: overall status plus one health word per adapter.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub adapters: BTreeMap<String, AdapterHealth>,
}

/// Adapter entry inside [`ExecutionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    pub status: AdapterHealth,
    pub latency: u64,
    pub requests: u64,
    pub errors: u64,
}

/// Full execution view: run flag, uptime, totals, adapter detail, and
/// one telemetry sample.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStatus {
    pub is_running: bool,
    /// Rendered as `"3h 24m"`.
    pub uptime: String,
    pub total_requests: u64,
    pub total_errors: u64,
    pub adapters: BTreeMap<String, AdapterStats>,
    pub system_stats: SystemTelemetry,
}

/// One row of the adapter detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterStatusEntry {
    pub name: String,
    pub status: AdapterHealth,
    /// `"45ms"`, or `"timeout"` when the adapter never answered.
    pub latency: String,
    pub requests: u64,
    pub errors: u64,
}

/// Aggregate block of the adapter detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemOverview {
    pub cpu_usage: String,
    pub memory_usage: String,
    pub uptime: String,
    pub synthetic: bool,
}

/// Adapter detail view: one entry per adapter plus aggregate figures.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterReport {
    pub adapters: Vec<AdapterStatusEntry>,
    pub system: SystemOverview,
}

/// Read-side facade over the registry and the telemetry source.
#[derive(Clone)]
pub struct StatusAggregator {
    registry: Arc<MetricsRegistry>,
    telemetry: Arc<dyn TelemetrySource>,
}

impl StatusAggregator {
    pub fn new(registry: Arc<MetricsRegistry>, telemetry: Arc<dyn TelemetrySource>) -> Self {
        Self { registry, telemetry }
    }

    /// Liveness view. Succeeds regardless of the run flag; a stopped
    /// system still answers health checks.
    pub fn health(&self) -> HealthReport {
        self.registry.record_request();
        let snapshot = self.registry.snapshot();
        HealthReport {
            status: "ok",
            version: VERSION,
            adapters: snapshot
                .adapters
                .into_iter()
                .map(|(name, record)| (name, record.status))
                .collect(),
        }
    }

    /// Full execution view with a fresh telemetry sample.
    pub fn execution_status(&self) -> ExecutionStatus {
        self.registry.record_request();
        let snapshot = self.registry.snapshot();
        ExecutionStatus {
            is_running: snapshot.is_running,
            uptime: format_uptime(snapshot.uptime),
            total_requests: snapshot.total_requests,
            total_errors: snapshot.total_errors,
            adapters: snapshot
                .adapters
                .into_iter()
                .map(|(name, record)| {
                    (
                        name,
                        AdapterStats {
                            status: record.status,
                            latency: record.latency_ms,
                            requests: record.requests,
                            errors: record.errors,
                        },
                    )
                })
                .collect(),
            system_stats: self.telemetry.sample(),
        }
    }

    /// Adapter detail view with aggregate figures.
    pub fn adapter_status(&self) -> AdapterReport {
        self.registry.record_request();
        let snapshot = self.registry.snapshot();
        let sample = self.telemetry.sample();
        AdapterReport {
            adapters: snapshot
                .adapters
                .into_iter()
                .map(|(name, record)| AdapterStatusEntry {
                    name,
                    status: record.status,
                    latency: format_latency(record.latency_ms),
                    requests: record.requests,
                    errors: record.errors,
                })
                .collect(),
            system: SystemOverview {
                cpu_usage: sample.cpu,
                memory_usage: sample.memory,
                uptime: format_uptime(snapshot.uptime),
                synthetic: sample.synthetic,
            },
        }
    }
}

/// Render a monotonic uptime as the dashboard's `"Xh Ym"`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Render a stored latency; zero means the adapter never answered.
pub fn format_latency(latency_ms: u64) -> String {
    if latency_ms == 0 {
        "timeout".to_string()
    } else {
        format!("{latency_ms}ms")
    }
}
