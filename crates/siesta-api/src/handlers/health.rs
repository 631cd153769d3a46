//! Health check handlers for service monitoring.
//!
//! Provides liveness and health endpoints for orchestration systems.
//! The service holds no local storage, so both checks are lightweight.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: &'static str,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Provider environment the service is configured against
    pub environment: String,
    /// Service version information
    pub version: &'static str,
}

/// Primary health check endpoint.
///
/// Reports service status, configured provider environment, and version.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    debug!("Processing health check request");

    let response = HealthResponse {
        status: "healthy",
        timestamp: state.clock.now_utc(),
        environment: state.config.environment.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Liveness check endpoint.
///
/// Confirms the process is responsive. Used by orchestrators to decide
/// whether to restart the container.
#[instrument(name = "liveness_check", skip(state))]
pub async fn liveness_check(State(state): State<AppState>) -> Response {
    let body = serde_json::json!({
        "status": "alive",
        "timestamp": state.clock.now_utc(),
        "service": "siesta-api",
    });

    (StatusCode::OK, Json(body)).into_response()
}
