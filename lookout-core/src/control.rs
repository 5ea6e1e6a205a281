//! Control plane over the run-state.
//!
//! Four actions, all idempotent at the registry level: `start`, `stop`,
//! `restart`, `rollback`. Parsing a client-supplied action name is the
//! only fallible step; applying a parsed action always succeeds. Every
//! applied action is announced on the live log stream.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::broadcast::{LogBroadcaster, LogEvent};
use crate::error::ControlError;
use crate::registry::MetricsRegistry;

/// Actions accepted by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
    Rollback,
}

impl ControlAction {
    /// Parse a client-supplied action name, case-insensitively.
    pub fn parse(action: &str) -> Result<Self, ControlError> {
        match action.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "rollback" => Ok(Self::Rollback),
            _ => Err(ControlError::unknown_action(action)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a handled action reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlOutcome {
    pub status: &'static str,
    pub message: &'static str,
}

/// Applies control actions to the registry and announces them on the
/// log stream.
#[derive(Clone)]
pub struct ControlPlane {
    registry: Arc<MetricsRegistry>,
    broadcaster: Arc<LogBroadcaster>,
}

impl ControlPlane {
    pub fn new(registry: Arc<MetricsRegistry>, broadcaster: Arc<LogBroadcaster>) -> Self {
        Self { registry, broadcaster }
    }

    /// Apply one action to the registry.
    ///
    /// Repeating an action is harmless: `start` on a running system and
    /// `stop` on a stopped one report success without changing anything.
    pub fn apply(&self, action: ControlAction) -> ControlOutcome {
        let outcome = match action {
            ControlAction::Start => {
                self.registry.set_running(true);
                ControlOutcome {
                    status: "started",
                    message: "System started",
                }
            }
            ControlAction::Stop => {
                self.registry.set_running(false);
                ControlOutcome {
                    status: "stopped",
                    message: "System stopped",
                }
            }
            ControlAction::Restart => {
                self.registry.mark_restarted();
                ControlOutcome {
                    status: "restarted",
                    message: "System restarted",
                }
            }
            ControlAction::Rollback => {
                self.registry.rollback();
                ControlOutcome {
                    status: "rollback",
                    message: "Emergency rollback executed",
                }
            }
        };

        if action == ControlAction::Rollback {
            tracing::warn!(action = %action, status = outcome.status, "control action applied");
        } else {
            tracing::info!(action = %action, status = outcome.status, "control action applied");
        }
        self.broadcaster.broadcast(&LogEvent::now(outcome.message));
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{AdapterHealth, AdapterRecord};

    fn control_plane() -> (Arc<MetricsRegistry>, Arc<LogBroadcaster>, ControlPlane) {
        let registry = Arc::new(MetricsRegistry::new([(
            "ollama".to_string(),
            AdapterRecord::new(AdapterHealth::Healthy, 45, 0, 0),
        )]));
        let broadcaster = Arc::new(LogBroadcaster::new(8));
        let plane = ControlPlane::new(registry.clone(), broadcaster.clone());
        (registry, broadcaster, plane)
    }

    #[test]
    fn test_parse_accepts_the_four_actions_case_insensitively() {
        assert_eq!(ControlAction::parse("start").unwrap(), ControlAction::Start);
        assert_eq!(ControlAction::parse("STOP").unwrap(), ControlAction::Stop);
        assert_eq!(
            ControlAction::parse("Restart").unwrap(),
            ControlAction::Restart
        );
        assert_eq!(
            ControlAction::parse("rollback").unwrap(),
            ControlAction::Rollback
        );
    }

    #[test]
    fn test_parse_rejects_unknown_actions() {
        let err = ControlAction::parse("pause").unwrap_err();
        assert_eq!(err, ControlError::unknown_action("pause"));
    }

    #[test]
    fn test_stop_then_start_round_trip() {
        let (registry, _, plane) = control_plane();

        let outcome = plane.apply(ControlAction::Stop);
        assert_eq!(outcome.status, "stopped");
        assert!(!registry.is_running());

        let outcome = plane.apply(ControlAction::Start);
        assert_eq!(outcome.status, "started");
        assert!(registry.is_running());
    }

    #[test]
    fn test_repeated_stop_is_harmless() {
        let (registry, _, plane) = control_plane();
        plane.apply(ControlAction::Stop);
        let outcome = plane.apply(ControlAction::Stop);
        assert_eq!(outcome.status, "stopped");
        assert!(!registry.is_running());
    }

    #[test]
    fn test_restart_starts_a_fresh_uptime_epoch() {
        let (registry, _, plane) = control_plane();
        plane.apply(ControlAction::Stop);
        std::thread::sleep(std::time::Duration::from_millis(10));
        let before = registry.snapshot();

        let outcome = plane.apply(ControlAction::Restart);

        assert_eq!(outcome.status, "restarted");
        let after = registry.snapshot();
        assert!(after.is_running);
        assert!(after.started_at >= before.started_at);
        assert!(after.uptime < before.uptime);
    }

    #[test]
    fn test_rollback_clears_error_counters() {
        let (registry, _, plane) = control_plane();
        registry.record_error();

        let outcome = plane.apply(ControlAction::Rollback);

        assert_eq!(outcome.status, "rollback");
        assert_eq!(outcome.message, "Emergency rollback executed");
        assert_eq!(registry.snapshot().total_errors, 0);
    }

    #[tokio::test]
    async fn test_actions_are_announced_on_the_log_stream() {
        let (_, broadcaster, plane) = control_plane();
        let mut subscription = broadcaster.subscribe();
        // Drain the connection acknowledgement first.
        let ack = subscription.rx.recv().await.unwrap();
        assert_eq!(ack.message, "log stream connected");

        plane.apply(ControlAction::Stop);
        let event = subscription.rx.recv().await.unwrap();
        assert_eq!(event.message, "System stopped");

        plane.apply(ControlAction::Rollback);
        let event = subscription.rx.recv().await.unwrap();
        assert_eq!(event.message, "Emergency rollback executed");
    }
}
