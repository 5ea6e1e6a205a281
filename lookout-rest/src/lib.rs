//! lookout-rest - REST API server for lookout
//!
//! Provides HTTP endpoints over the status registry and control plane:
//! - GET /health - liveness plus per-adapter health
//! - GET /execution/status - full execution view for the dashboard
//! - POST /execution/control - start | stop | restart | rollback
//! - GET /adapters/status - adapter detail with aggregate figures
//! - POST /system/rollback - emergency error-counter reset
//! - POST /predict - run submitted code through the analysis backend
//! - POST /explain - structural explanation of submitted code
//! - GET /ws/logs - live log stream (WebSocket)
//!
//! All state is process-local: counters reset on restart, and the log
//! stream carries only events broadcast while the subscriber is connected.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use lookout_core::{
    AdapterReport, AdapterUpdate, CodeAnalyzer, Config, ControlAction, ControlOutcome,
    ControlPlane, ExecutionStatus, Finding, HealthReport, LogBroadcaster, MetricsRegistry,
    PatternAnalyzer, StatusAggregator, SyntheticTelemetry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod ws;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MetricsRegistry>,
    pub status: StatusAggregator,
    pub control: ControlPlane,
    pub broadcaster: Arc<LogBroadcaster>,
    pub analyzer: Arc<dyn CodeAnalyzer>,
    /// Adapter credited with execution-endpoint traffic.
    pub exec_adapter: String,
}

impl AppState {
    /// Wire up shared state from config with the default collaborators:
    /// synthetic telemetry and the pattern analyzer.
    pub fn from_config(config: &Config) -> Self {
        let registry = Arc::new(MetricsRegistry::new(config.adapter_records()));
        let broadcaster = Arc::new(LogBroadcaster::new(config.feed.subscriber_buffer));
        Self {
            status: StatusAggregator::new(registry.clone(), Arc::new(SyntheticTelemetry)),
            control: ControlPlane::new(registry.clone(), broadcaster.clone()),
            registry,
            broadcaster,
            analyzer: Arc::new(PatternAnalyzer),
            exec_adapter: config.exec.adapter.clone(),
        }
    }
}

/// Control request
#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub action: String,
}

/// Code submission request for the execution endpoints
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub output: String,
}

/// Explanation response
#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

/// Rollback acknowledgement
#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Build the REST API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/execution/status", get(execution_status))
        .route("/execution/control", post(execution_control))
        .route("/adapters/status", get(adapter_status))
        .route("/system/rollback", post(system_rollback))
        .route("/predict", post(predict))
        .route("/explain", post(explain))
        .route("/ws/logs", get(ws::logs_ws))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.status.health())
}

/// Full execution view
async fn execution_status(State(state): State<AppState>) -> Json<ExecutionStatus> {
    Json(state.status.execution_status())
}

/// Apply a control action to the running system
async fn execution_control(
    State(state): State<AppState>,
    Json(req): Json<ControlRequest>,
) -> Result<Json<ControlOutcome>, ApiError> {
    let action =
        ControlAction::parse(&req.action).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(state.control.apply(action)))
}

/// Adapter detail view
async fn adapter_status(State(state): State<AppState>) -> Json<AdapterReport> {
    Json(state.status.adapter_status())
}

/// Emergency rollback: zero the global and per-adapter error counters
async fn system_rollback(State(state): State<AppState>) -> Json<RollbackResponse> {
    state.control.apply(ControlAction::Rollback);
    Json(RollbackResponse {
        status: "rollback_initiated",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Run submitted code through the analysis backend
///
/// Issue findings count against the error totals; a structural or
/// output-only report does not.
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let code = gate_submission(&state, &req)?;
    let report = state.analyzer.analyze(code);

    let found_issues = report.has(Finding::PotentialIssue);
    if found_issues {
        state.registry.record_error();
    }
    attribute_exec_traffic(&state, found_issues);

    let output = if found_issues {
        format!(
            "Potential issues detected in {} chars, {} lines",
            report.char_count, report.line_count
        )
    } else if report.has(Finding::OutputOperation) {
        format!("Output operation detected: {} chars processed", report.char_count)
    } else {
        format!(
            "Code analysis complete: {} chars, {} lines",
            report.char_count, report.line_count
        )
    };

    Ok(Json(PredictResponse { output }))
}

/// Explain the structure of submitted code
async fn explain(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let code = gate_submission(&state, &req)?;
    let report = state.analyzer.analyze(code);
    attribute_exec_traffic(&state, false);

    let mut parts: Vec<&'static str> = report
        .findings
        .iter()
        .filter(|finding| finding.is_structural())
        .map(Finding::describe)
        .collect();
    if parts.is_empty() {
        parts.push("Basic code structure");
    }

    let explanation = format!("{} | Lines: {}", parts.join(" | "), report.line_count);
    Ok(Json(ExplainResponse { explanation }))
}

/// Shared front half of the execution endpoints: request bookkeeping,
/// run-state gate, input validation. Returns the trimmed submission.
fn gate_submission<'a>(state: &AppState, req: &'a CodeRequest) -> Result<&'a str, ApiError> {
    state.registry.record_request();

    if !state.registry.is_running() {
        return Err(ApiError::Unavailable("System is not running".to_string()));
    }

    let code = req.code.trim();
    if code.is_empty() {
        return Err(ApiError::BadRequest("Empty code provided".to_string()));
    }

    Ok(code)
}

/// Credit one execution request (and optionally one error) to the
/// configured adapter. Attribution is bookkeeping; a missing adapter is
/// logged, never surfaced to the client.
fn attribute_exec_traffic(state: &AppState, error: bool) {
    let update = AdapterUpdate {
        request_delta: 1,
        error_delta: u64::from(error),
        ..Default::default()
    };
    if let Err(err) = state.registry.update_adapter(&state.exec_adapter, update) {
        tracing::warn!(adapter = %state.exec_adapter, error = %err, "skipping adapter attribution");
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
