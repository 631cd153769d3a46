//! Bulk reschedule dispatch with failure isolation.
//!
//! This crate carries the one component of the sleep webhook with real
//! concurrency content: given today's active bookings, invoke the external
//! reschedule operation once per booking under a bounded concurrency cap and
//! aggregate per-item outcomes without letting one failure abort the batch.
//!
//! # Dispatch model
//!
//! The dispatcher spawns one supervised task per booking into a
//! [`tokio::task::JoinSet`], gated by a semaphore sized to the configured
//! cap. The batch settles only when every task has settled; a failing or
//! panicking item is recorded as a failure outcome and never cancels its
//! siblings. There is no per-item retry and no batch cancellation path.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use siesta_core::Rescheduler;
//! use siesta_dispatch::{DispatchConfig, RescheduleDispatcher};
//!
//! # async fn example(rescheduler: Arc<dyn Rescheduler>, bookings: Vec<siesta_core::Booking>) {
//! let dispatcher = RescheduleDispatcher::new(rescheduler, DispatchConfig::default());
//! let report = dispatcher.dispatch_all(bookings, "Not enough sleep last night").await;
//! if !report.is_fully_successful() {
//!     eprintln!("{} reschedules failed", report.failure_count());
//! }
//! # }
//! ```

pub mod client;
pub mod dispatcher;
pub mod error;

pub use client::{BookingApiClient, BookingClientConfig};
pub use dispatcher::{DispatchConfig, DispatchReport, RescheduleDispatcher};
pub use error::{DispatchError, Result};

/// Default concurrency cap for reschedule dispatch.
///
/// One booking at a time by default; the cap is the only genuine scaling
/// knob in this subsystem and can be raised through configuration.
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Default HTTP timeout for booking-system calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
