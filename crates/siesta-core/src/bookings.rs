//! Seams to the external booking system.
//!
//! The persistence layer and the reschedule operation both live outside this
//! service; these traits are the contracts it consumes. Production wires in
//! HTTP-backed implementations, tests inject in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    models::{Booking, BookingUid},
};

/// Read access to the booking store.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Returns all bookings whose start and end fall inside `[start, end]`
    /// and whose status is in the active set (accepted or pending).
    ///
    /// An empty result is a valid, common outcome and must not be an error.
    async fn find_active_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;
}

/// The external reschedule operation.
///
/// Availability search, notifications, and retry are this operation's own
/// responsibility; callers treat it as atomic and opaque.
#[async_trait]
pub trait Rescheduler: Send + Sync {
    /// Requests a reschedule of one booking with a human-readable reason.
    async fn reschedule(&self, booking_uid: &BookingUid, reason: &str) -> Result<()>;
}
