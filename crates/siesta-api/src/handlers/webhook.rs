//! Sleep webhook handler: verify, classify, evaluate, dispatch.
//!
//! Accepts signed sleep-data events from the health-data provider. A
//! `daily.data.sleep.created` event whose session falls short of the
//! minimum duration triggers a reschedule of every booking active today.
//! Downstream failures are logged and swallowed so the provider still
//! receives an acknowledgement and does not redeliver.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use siesta_core::{
    classify, day_window, is_insufficient, EventKind, ProviderEvent, Result, SiestaError,
    SleepSession,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::Environment,
    crypto::{SignatureHeaders, ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER},
    state::AppState,
};

/// Error response body.
///
/// The `stack` field carries diagnostic detail and is omitted entirely in
/// the production environment.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error description
    pub message: String,
    /// Diagnostic detail, absent in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Receives a signed sleep event from the provider.
///
/// Requests that fail signature verification are rejected before any
/// payload inspection. Once verified, the payload is always acknowledged
/// with 200 and echoed back, whatever the downstream outcome.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 400: Missing signature header, failed verification, or unparseable body
/// - 405: Non-POST method (enforced by the router)
#[instrument(name = "sleep_webhook", skip(state, headers, body))]
pub async fn receive_sleep_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = header_str(&headers, SIGNATURE_HEADER) else {
        warn!("Webhook rejected: signature header missing");
        return error_response(&SiestaError::MissingSignature, state.config.environment);
    };

    let signature_headers = SignatureHeaders {
        id: header_str(&headers, ID_HEADER).unwrap_or_default(),
        timestamp: header_str(&headers, TIMESTAMP_HEADER).unwrap_or_default(),
        signature,
    };
    if let Err(e) = state.verifier.verify(&body, &signature_headers, state.clock.now_utc()) {
        warn!(error = %e, "Webhook rejected: signature verification failed");
        return error_response(
            &SiestaError::InvalidSignature { reason: e.to_string() },
            state.config.environment,
        );
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Webhook rejected: body is not valid JSON");
            return error_response(
                &SiestaError::InvalidPayload(e.to_string()),
                state.config.environment,
            );
        },
    };

    // Non-object payloads carry no event type and fall through as ignored.
    let event: ProviderEvent = serde_json::from_value(payload.clone())
        .unwrap_or_else(|_| ProviderEvent { event_type: String::new(), data: serde_json::Value::Null });

    match classify(&event) {
        EventKind::Ignored => {
            debug!(event_type = %event.event_type, "Ignoring event type");
        },
        EventKind::SleepCreated(data) => {
            if let Err(e) = process_sleep_event(&state, &data).await {
                // Acknowledgement is decoupled from downstream outcomes.
                error!(error = %e, "Sleep event processing failed");
            }
        },
    }

    (StatusCode::OK, Json(json!({ "body": payload }))).into_response()
}

/// Evaluates a sleep session and reschedules today's bookings if it falls
/// short of the minimum duration.
async fn process_sleep_event(state: &AppState, data: &serde_json::Value) -> Result<()> {
    let session = SleepSession::from_payload(data)?;

    if !is_insufficient(session.duration_seconds) {
        info!(hours = session.hours(), "Sufficient sleep, no action taken");
        return Ok(());
    }
    info!(hours = session.hours(), "Insufficient sleep, rescheduling today's bookings");

    let (start, end) = day_window(state.clock.now_utc());
    let bookings = state.bookings.find_active_in_window(start, end).await?;
    if bookings.is_empty() {
        debug!("No active bookings in today's window");
        return Ok(());
    }

    info!(booking_count = bookings.len(), "Dispatching reschedule calls");
    let report = state.dispatcher.dispatch_all(bookings, &state.config.reschedule_reason).await;

    for outcome in report.failures() {
        warn!(booking_uid = %outcome.booking_uid, "Reschedule failed");
    }
    if report.failure_count() > 0 {
        return Err(SiestaError::RescheduleBatch {
            failed: report.failure_count(),
            attempted: report.attempted(),
        });
    }

    info!(booking_count = report.attempted(), "All reschedule calls succeeded");
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Creates a standardized error response.
///
/// Outside production the body carries a `stack` field with the debug
/// rendering of the error for easier integration debugging.
pub fn error_response(error: &SiestaError, environment: Environment) -> Response {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody {
        message: error.to_string(),
        stack: if environment.is_production() { None } else { Some(format!("{error:?}")) },
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_omits_stack_when_absent() {
        let body = ErrorBody { message: "boom".to_string(), stack: None };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json, json!({ "message": "boom" }));
    }

    #[test]
    fn error_response_status_mirrors_error() {
        let response = error_response(&SiestaError::MissingSignature, Environment::Production);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(
            &SiestaError::RescheduleBatch { failed: 1, attempted: 3 },
            Environment::Sandbox,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn header_lookup_ignores_missing_values() {
        let headers = HeaderMap::new();
        assert!(header_str(&headers, SIGNATURE_HEADER).is_none());
    }
}
