//! Process-wide metrics registry.
//!
//! Holds the run flag, the uptime clocks, the global request/error
//! counters, and the per-adapter records behind a single [`RwLock`].
//! Writers take the lock briefly per mutation; readers take a cloned
//! [`SystemSnapshot`] so no lock is held across response shaping. The
//! single lock is what makes `rollback` atomic: a concurrent snapshot
//! observes either every counter pre-reset or every counter post-reset,
//! never a mix.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::RegistryError;
use crate::types::{AdapterHealth, AdapterRecord, SystemSnapshot};

/// Partial update applied to one adapter record.
///
/// `None` fields are left untouched; deltas are added to the stored
/// counters. Counters only ever move up through this path, `rollback`
/// is the one thing that resets them.
#[derive(Debug, Clone, Default)]
pub struct AdapterUpdate {
    pub status: Option<AdapterHealth>,
    pub latency_ms: Option<u64>,
    pub request_delta: u64,
    pub error_delta: u64,
}

struct RegistryState {
    is_running: bool,
    started_at: DateTime<Utc>,
    started: Instant,
    total_requests: u64,
    total_errors: u64,
    adapters: BTreeMap<String, AdapterRecord>,
}

/// Shared registry of run-state and health counters.
///
/// Constructed once at startup from the configured adapter seeds and
/// handed to every component as an `Arc<MetricsRegistry>`; there are no
/// ambient globals.
pub struct MetricsRegistry {
    state: RwLock<RegistryState>,
}

impl MetricsRegistry {
    /// Create a registry seeded with the given adapters, running as of now.
    pub fn new(adapters: impl IntoIterator<Item = (String, AdapterRecord)>) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                is_running: true,
                started_at: Utc::now(),
                started: Instant::now(),
                total_requests: 0,
                total_errors: 0,
                adapters: adapters.into_iter().collect(),
            }),
        }
    }

    /// Count one inbound request against the global total.
    pub fn record_request(&self) {
        self.state.write().total_requests += 1;
    }

    /// Count one failed request against the global total.
    ///
    /// Global and per-adapter error counters are independent; attribution
    /// to an adapter goes through [`MetricsRegistry::update_adapter`].
    pub fn record_error(&self) {
        self.state.write().total_errors += 1;
    }

    /// Apply a partial update to one adapter record.
    ///
    /// Returns [`RegistryError::UnknownAdapter`] and leaves all state
    /// untouched when `name` was never seeded.
    pub fn update_adapter(&self, name: &str, update: AdapterUpdate) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let record = state
            .adapters
            .get_mut(name)
            .ok_or_else(|| RegistryError::unknown_adapter(name))?;
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(latency_ms) = update.latency_ms {
            record.latency_ms = latency_ms;
        }
        record.requests += update.request_delta;
        record.errors += update.error_delta;
        Ok(())
    }

    /// Zero the global error counter and every adapter's error count.
    ///
    /// Runs entirely under the write lock; concurrent readers see the
    /// counters either all pre-reset or all post-reset. Request counters,
    /// the run flag, and the uptime epoch are untouched.
    pub fn rollback(&self) {
        let mut state = self.state.write();
        state.total_errors = 0;
        for record in state.adapters.values_mut() {
            record.errors = 0;
        }
    }

    /// Flip the run flag without touching the uptime clocks.
    pub fn set_running(&self, running: bool) {
        self.state.write().is_running = running;
    }

    /// Mark a restart: running again, with a fresh uptime epoch.
    pub fn mark_restarted(&self) {
        let mut state = self.state.write();
        state.is_running = true;
        state.started_at = Utc::now();
        state.started = Instant::now();
    }

    /// Whether request-serving endpoints should accept work.
    pub fn is_running(&self) -> bool {
        self.state.read().is_running
    }

    /// Time since the last (re)start, from the monotonic clock.
    ///
    /// Never decreases within an uptime epoch, regardless of wall-clock
    /// adjustments.
    pub fn uptime(&self) -> Duration {
        self.state.read().started.elapsed()
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> SystemSnapshot {
        let state = self.state.read();
        SystemSnapshot {
            is_running: state.is_running,
            started_at: state.started_at,
            uptime: state.started.elapsed(),
            total_requests: state.total_requests,
            total_errors: state.total_errors,
            adapters: state.adapters.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn seeded_registry() -> MetricsRegistry {
        MetricsRegistry::new([
            (
                "ollama".to_string(),
                AdapterRecord::new(AdapterHealth::Healthy, 45, 1247, 0),
            ),
            (
                "deepseek".to_string(),
                AdapterRecord::new(AdapterHealth::Warning, 120, 892, 3),
            ),
            (
                "local_llm".to_string(),
                AdapterRecord::new(AdapterHealth::Error, 0, 0, 15),
            ),
        ])
    }

    #[test]
    fn test_new_registry_is_running_with_zeroed_totals() {
        let registry = seeded_registry();
        let snapshot = registry.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.total_errors, 0);
        assert_eq!(snapshot.adapters.len(), 3);
        assert_eq!(snapshot.adapters["deepseek"].errors, 3);
    }

    #[test]
    fn test_concurrent_request_counting_loses_nothing() {
        let registry = seeded_registry();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        registry.record_request();
                    }
                });
            }
        });
        assert_eq!(registry.snapshot().total_requests, 8_000);
    }

    #[test]
    fn test_update_adapter_applies_partial_fields() {
        let registry = seeded_registry();
        registry
            .update_adapter(
                "ollama",
                AdapterUpdate {
                    status: Some(AdapterHealth::Warning),
                    latency_ms: Some(90),
                    request_delta: 2,
                    error_delta: 1,
                },
            )
            .unwrap();

        let snapshot = registry.snapshot();
        let record = &snapshot.adapters["ollama"];
        assert_eq!(record.status, AdapterHealth::Warning);
        assert_eq!(record.latency_ms, 90);
        assert_eq!(record.requests, 1249);
        assert_eq!(record.errors, 1);
    }

    #[test]
    fn test_update_adapter_none_fields_leave_record_alone() {
        let registry = seeded_registry();
        registry
            .update_adapter("deepseek", AdapterUpdate::default())
            .unwrap();

        let snapshot = registry.snapshot();
        let record = &snapshot.adapters["deepseek"];
        assert_eq!(record.status, AdapterHealth::Warning);
        assert_eq!(record.latency_ms, 120);
        assert_eq!(record.requests, 892);
        assert_eq!(record.errors, 3);
    }

    #[test]
    fn test_update_unknown_adapter_fails_and_changes_nothing() {
        let registry = seeded_registry();
        let before = registry.snapshot();

        let err = registry
            .update_adapter(
                "mystery",
                AdapterUpdate {
                    request_delta: 100,
                    error_delta: 100,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, RegistryError::unknown_adapter("mystery"));

        let after = registry.snapshot();
        assert_eq!(after.total_errors, before.total_errors);
        assert_eq!(after.adapters, before.adapters);
    }

    #[test]
    fn test_rollback_zeroes_global_and_adapter_errors() {
        let registry = seeded_registry();
        registry.record_error();
        registry.record_error();

        registry.rollback();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_errors, 0);
        for record in snapshot.adapters.values() {
            assert_eq!(record.errors, 0);
        }
    }

    #[test]
    fn test_rollback_preserves_requests_and_run_state() {
        let registry = seeded_registry();
        registry.record_request();
        registry.record_error();

        registry.rollback();

        let snapshot = registry.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.adapters["ollama"].requests, 1247);
    }

    #[test]
    fn test_rollback_is_atomic_under_concurrent_snapshots() {
        let registry = MetricsRegistry::new([(
            "x".to_string(),
            AdapterRecord::new(AdapterHealth::Healthy, 10, 0, 5),
        )]);
        registry.record_error();
        registry.record_error();
        registry.record_error();
        registry.record_error();
        registry.record_error();

        std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                // Every observed snapshot must be all-5s or all-0s.
                for _ in 0..2_000 {
                    let snapshot = registry.snapshot();
                    let adapter_errors = snapshot.adapters["x"].errors;
                    assert!(
                        (snapshot.total_errors == 5 && adapter_errors == 5)
                            || (snapshot.total_errors == 0 && adapter_errors == 0),
                        "partial rollback observed: total={} adapter={}",
                        snapshot.total_errors,
                        adapter_errors
                    );
                }
            });
            scope.spawn(|| registry.rollback());
            reader.join().unwrap();
        });

        assert_eq!(registry.snapshot().total_errors, 0);
    }

    #[test]
    fn test_stop_and_start_toggle_only_the_run_flag() {
        let registry = seeded_registry();
        let epoch = registry.snapshot().started_at;

        registry.set_running(false);
        assert!(!registry.is_running());
        registry.set_running(true);
        assert!(registry.is_running());

        assert_eq!(registry.snapshot().started_at, epoch);
    }

    #[test]
    fn test_restart_resets_the_uptime_epoch() {
        let registry = seeded_registry();
        registry.set_running(false);
        std::thread::sleep(Duration::from_millis(10));
        let before = registry.snapshot();

        registry.mark_restarted();

        let after = registry.snapshot();
        assert!(after.is_running);
        assert!(after.started_at >= before.started_at);
        assert!(after.uptime < before.uptime);
    }
}
