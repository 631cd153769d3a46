//! Core domain models and sleep-evaluation logic.
//!
//! Provides strongly-typed booking primitives, provider event
//! classification, the sleep sufficiency heuristic, and error handling for
//! the sleep-triggered reschedule pipeline. The other crates depend on these
//! foundational types for type safety and consistency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bookings;
pub mod error;
pub mod events;
pub mod models;
pub mod sleep;
pub mod time;

pub use bookings::{BookingRepository, Rescheduler};
pub use error::{Result, SiestaError};
pub use events::{classify, EventKind, ProviderEvent, SLEEP_CREATED_EVENT};
pub use models::{
    Booking, BookingId, BookingStatus, BookingUid, RescheduleOutcome, RescheduleResult,
};
pub use sleep::{is_insufficient, SleepSession, MIN_SLEEP_HOURS};
pub use time::{day_window, Clock, RealClock, TestClock};
