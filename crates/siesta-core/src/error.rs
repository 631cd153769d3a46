//! Error types and result handling for webhook processing.
//!
//! Defines the error taxonomy with HTTP status mapping. Only failures that
//! occur before trust is established (bad method, bad signature, malformed
//! payload) surface to the provider; everything downstream of verification
//! is logged and swallowed so the webhook is still acknowledged with 200.

use thiserror::Error;

/// Result type alias using [`SiestaError`].
pub type Result<T> = std::result::Result<T, SiestaError>;

/// Error taxonomy for the sleep webhook pipeline.
#[derive(Debug, Error)]
pub enum SiestaError {
    /// Request used a method other than POST.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Signature header absent from the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Signature present but failed verification.
    #[error("Invalid signature: {reason}")]
    InvalidSignature {
        /// Why verification failed.
        reason: String,
    },

    /// Request body was not valid JSON.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Sleep payload could not be evaluated.
    #[error("Sleep evaluation failed: {0}")]
    SleepEvaluation(String),

    /// Booking lookup against the external booking system failed.
    #[error("Booking lookup failed: {0}")]
    BookingLookup(String),

    /// A single reschedule call against the booking system failed.
    #[error("Reschedule failed: {0}")]
    Reschedule(String),

    /// One or more dispatches in a reschedule batch failed.
    #[error("Failed to reschedule {failed} of {attempted} bookings")]
    RescheduleBatch {
        /// Number of failed dispatches.
        failed: usize,
        /// Number of dispatches attempted.
        attempted: usize,
    },

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiestaError {
    /// Returns the HTTP status code this error maps to.
    ///
    /// Pre-verification failures carry their client-facing codes; anything
    /// past verification is an internal failure and defaults to 500, though
    /// those errors are swallowed before response shaping in practice.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::MissingSignature | Self::InvalidSignature { .. } | Self::InvalidPayload(_) => 400,
            Self::SleepEvaluation(_)
            | Self::BookingLookup(_)
            | Self::Reschedule(_)
            | Self::RescheduleBatch { .. }
            | Self::Other(_) => 500,
        }
    }

    /// Returns whether this error is recovered locally after verification.
    ///
    /// Recoverable errors are logged and the webhook is still acknowledged
    /// with 200; the provider cannot fix them by redelivering the same event.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SleepEvaluation(_)
                | Self::BookingLookup(_)
                | Self::Reschedule(_)
                | Self::RescheduleBatch { .. }
        )
    }
}
