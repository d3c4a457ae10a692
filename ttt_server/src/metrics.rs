//! Prometheus metrics for monitoring server health and game activity.
//!
//! When `METRICS_BIND` is set, metrics are exposed in Prometheus text format at
//! `http://<addr>/metrics`. Without an installed exporter the recording
//! functions are no-ops.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **Auth Metrics**: Login attempts
//! - **Game Metrics**: Games started, outcomes, oracle failures
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ttt_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/auth/login", 200);
//! metrics::game_outcomes_total(metrics::GameOutcome::Win);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    ::metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    ::metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    ::metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// A finished game from the human player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            GameOutcome::Win => "win",
            GameOutcome::Loss => "loss",
            GameOutcome::Draw => "draw",
        }
    }
}

/// Increment games started counter.
pub fn games_started_total(computer_first: bool) {
    ::metrics::counter!("games_started_total",
        "computer_first" => computer_first.to_string()
    )
    .increment(1);
}

/// Increment finished games counter.
pub fn game_outcomes_total(outcome: GameOutcome) {
    ::metrics::counter!("game_outcomes_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Increment move oracle failure counter.
pub fn oracle_errors_total(kind: &'static str) {
    ::metrics::counter!("oracle_errors_total",
        "kind" => kind
    )
    .increment(1);
}
