//! Booking domain models and strongly-typed identifiers.
//!
//! Defines the read-only booking projection this service consumes, the
//! active-status filter, and the per-dispatch reschedule outcome. Newtype ID
//! wrappers prevent mixing the internal numeric id with the external uid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal numeric booking identifier.
///
/// Owned by the booking persistence layer; opaque to this service apart from
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BookingId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// External booking identifier used by the reschedule API.
///
/// This is the identifier the booking system exposes publicly and the one
/// every reschedule call is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingUid(pub String);

impl BookingUid {
    /// Creates a booking uid from anything string-like.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the uid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookingUid {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Confirmed by the host.
    Accepted,
    /// Awaiting host confirmation.
    Pending,
    /// Cancelled by either party.
    Cancelled,
    /// Rejected by the host.
    Rejected,
}

impl BookingStatus {
    /// Statuses that make a booking eligible for same-day rescheduling.
    pub const ACTIVE: [Self; 2] = [Self::Accepted, Self::Pending];

    /// Returns whether this status is in the active set.
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Returns the canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only booking projection consumed by the reschedule flow.
///
/// The lookup contract guarantees that every booking handed to the
/// dispatcher falls inside the current day's window with an active status;
/// the dispatcher does not re-validate this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Internal numeric identifier.
    pub id: BookingId,
    /// External identifier used by the reschedule API.
    pub uid: BookingUid,
    /// Current lifecycle status.
    pub status: BookingStatus,
}

/// Terminal result of a reschedule attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescheduleResult {
    /// The reschedule operation completed.
    Success,
    /// The reschedule operation failed.
    Failure {
        /// Human-readable failure reason for logging.
        reason: String,
    },
}

/// Result of a single reschedule dispatch attempt.
///
/// Ephemeral: produced per dispatch, consumed for aggregation and logging,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleOutcome {
    /// The booking the attempt was made for.
    pub booking_uid: BookingUid,
    /// Success, or the failure reason.
    pub result: RescheduleResult,
}

impl RescheduleOutcome {
    /// Creates a successful outcome.
    pub fn success(booking_uid: BookingUid) -> Self {
        Self { booking_uid, result: RescheduleResult::Success }
    }

    /// Creates a failed outcome with the given reason.
    pub fn failure(booking_uid: BookingUid, reason: impl Into<String>) -> Self {
        Self { booking_uid, result: RescheduleResult::Failure { reason: reason.into() } }
    }

    /// Returns whether this outcome records a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.result, RescheduleResult::Failure { .. })
    }
}
