//! Sleep sufficiency evaluation.
//!
//! A fixed heuristic, not a tunable policy engine: a night under
//! [`MIN_SLEEP_HOURS`] hours triggers the same-day reschedule flow. Missing,
//! zero, and negative durations all evaluate as insufficient so anomalous
//! payloads fail toward human review rather than silently passing.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SiestaError};

/// Minimum acceptable hours of sleep before same-day bookings are kept.
pub const MIN_SLEEP_HOURS: f64 = 5.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Sleep session extracted from a sleep-created event payload.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SleepSession {
    /// Wall-clock sleep duration in seconds; absent in the payload means 0.
    #[serde(default, rename = "duration")]
    pub duration_seconds: f64,
}

impl SleepSession {
    /// Extracts a sleep session from the raw event payload.
    ///
    /// A `null` payload or an object without a `duration` field yields a
    /// zero-duration session (insufficient by definition). Negative
    /// durations are passed through but logged as anomalous input.
    ///
    /// # Errors
    ///
    /// Returns [`SiestaError::SleepEvaluation`] when the payload shape
    /// cannot be interpreted at all (non-object data, non-numeric duration).
    pub fn from_payload(data: &Value) -> Result<Self> {
        let session = match data {
            Value::Null => Self { duration_seconds: 0.0 },
            value => serde_json::from_value(value.clone())
                .map_err(|e| SiestaError::SleepEvaluation(format!("malformed sleep payload: {e}")))?,
        };

        if session.duration_seconds < 0.0 {
            warn!(
                duration_seconds = session.duration_seconds,
                "negative sleep duration in provider payload, treating as insufficient"
            );
        }

        Ok(session)
    }

    /// Returns the duration in hours.
    pub fn hours(&self) -> f64 {
        self.duration_seconds / SECONDS_PER_HOUR
    }
}

/// Returns whether a sleep duration is below the minimum threshold.
///
/// Zero and negative durations are insufficient (fail-safe toward
/// triggering the reschedule review).
pub fn is_insufficient(duration_seconds: f64) -> bool {
    duration_seconds / SECONDS_PER_HOUR < MIN_SLEEP_HOURS
}
