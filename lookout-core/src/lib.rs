//! lookout-core - Core status aggregation logic for lookout (no HTTP deps)
//!
//! This crate contains the metrics registry, the derived status views, the
//! control plane, and the log broadcast machinery. It is intentionally free
//! of HTTP dependencies to enable easy testing and embedding; the REST and
//! WebSocket surface lives in `lookout-rest`.

pub mod analysis;
pub mod broadcast;
pub mod config;
pub mod control;
pub mod error;
pub mod registry;
pub mod status;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use analysis::{CodeAnalyzer, CodeReport, Finding, PatternAnalyzer};
pub use broadcast::{
    DEFAULT_SUBSCRIBER_BUFFER, LogBroadcaster, LogEvent, SubscriberId, Subscription, spawn_feed,
};
pub use config::{
    AdapterSeed, Config, ConfigError, DEFAULT_CONFIG_PATH, ExecConfig, FeedConfig, ServerConfig,
};
pub use control::{ControlAction, ControlOutcome, ControlPlane};
pub use error::{ControlError, RegistryError};
pub use registry::{AdapterUpdate, MetricsRegistry};
pub use status::{
    AdapterReport, AdapterStats, AdapterStatusEntry, ExecutionStatus, HealthReport,
    StatusAggregator, SystemOverview, VERSION, format_latency, format_uptime,
};
pub use telemetry::{SyntheticTelemetry, SystemTelemetry, TelemetrySource};
pub use types::{AdapterHealth, AdapterRecord, SystemSnapshot};
