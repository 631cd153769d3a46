//! Shared application state for request handlers.

use std::sync::Arc;

use siesta_core::{BookingRepository, Clock};
use siesta_dispatch::RescheduleDispatcher;

use crate::{config::Config, crypto::WebhookVerifier};

/// Application state shared across all handlers.
///
/// Every collaborator is held behind an `Arc` so the state clones cheaply
/// into each request. Tests substitute fake repositories, reschedulers, and
/// clocks through the same fields.
#[derive(Clone)]
pub struct AppState {
    /// Loaded service configuration.
    pub config: Arc<Config>,
    /// Verifier for inbound webhook signatures.
    pub verifier: Arc<WebhookVerifier>,
    /// Booking platform lookup collaborator.
    pub bookings: Arc<dyn BookingRepository>,
    /// Bounded-concurrency reschedule dispatcher.
    pub dispatcher: Arc<RescheduleDispatcher>,
    /// Time source for the day window computation.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates application state from its collaborators.
    pub fn new(
        config: Arc<Config>,
        verifier: Arc<WebhookVerifier>,
        bookings: Arc<dyn BookingRepository>,
        dispatcher: Arc<RescheduleDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, verifier, bookings, dispatcher, clock }
    }
}
