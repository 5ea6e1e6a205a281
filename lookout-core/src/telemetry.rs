//! Aggregate system telemetry.
//!
//! [`TelemetrySource`] is the seam between the status views and wherever
//! the CPU/memory/disk/network figures come from. The default
//! [`SyntheticTelemetry`] draws placeholder numbers from fixed ranges;
//! real host instrumentation can be dropped in without touching the
//! aggregator. Every sample carries `synthetic: true` so consumers cannot
//! mistake placeholder figures for live measurements.

use rand::Rng;
use serde::Serialize;

/// One sample of aggregate system figures, pre-formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemTelemetry {
    /// CPU utilization, e.g. `"23%"`.
    pub cpu: String,
    /// Memory utilization, e.g. `"68%"`.
    pub memory: String,
    /// Disk utilization, e.g. `"44%"`.
    pub disk: String,
    /// Network throughput, e.g. `"125 MB/s"`.
    pub network: String,
    /// True when the figures are placeholders rather than measurements.
    pub synthetic: bool,
}

/// Source of aggregate system figures for the status views.
pub trait TelemetrySource: Send + Sync {
    fn sample(&self) -> SystemTelemetry;
}

/// Placeholder telemetry: uniform draws from the ranges the dashboard
/// was built around.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTelemetry;

impl TelemetrySource for SyntheticTelemetry {
    fn sample(&self) -> SystemTelemetry {
        let mut rng = rand::thread_rng();
        SystemTelemetry {
            cpu: format!("{}%", rng.gen_range(15..=35)),
            memory: format!("{}%", rng.gen_range(60..=75)),
            disk: format!("{}%", rng.gen_range(40..=50)),
            network: format!("{} MB/s", rng.gen_range(100..=150)),
            synthetic: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn strip_percent(value: &str) -> u32 {
        value.trim_end_matches('%').parse().unwrap()
    }

    #[test]
    fn test_synthetic_samples_stay_in_range() {
        let source = SyntheticTelemetry;
        for _ in 0..100 {
            let sample = source.sample();
            assert!((15..=35).contains(&strip_percent(&sample.cpu)));
            assert!((60..=75).contains(&strip_percent(&sample.memory)));
            assert!((40..=50).contains(&strip_percent(&sample.disk)));

            let throughput: u32 = sample
                .network
                .strip_suffix(" MB/s")
                .unwrap()
                .parse()
                .unwrap();
            assert!((100..=150).contains(&throughput));
        }
    }

    #[test]
    fn test_synthetic_samples_are_labelled() {
        assert!(SyntheticTelemetry.sample().synthetic);
    }
}
