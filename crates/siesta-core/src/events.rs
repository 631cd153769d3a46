//! Provider event types and classification.
//!
//! The health-data provider sends many event types over the same webhook.
//! Classification routes only sleep-session-created events into the
//! evaluation path; every other discriminator maps to [`EventKind::Ignored`],
//! never to an error, so provider-added event types cannot fail the webhook.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator for sleep-session-created events.
pub const SLEEP_CREATED_EVENT: &str = "daily.data.sleep.created";

/// Verified webhook event as sent by the provider.
///
/// Untrusted until signature verification has passed; fully trusted after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Event type discriminator, e.g. `daily.data.sleep.created`.
    #[serde(default)]
    pub event_type: String,
    /// Event payload; shape depends on the event type.
    #[serde(default)]
    pub data: Value,
}

/// Classification of a verified provider event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A sleep session was recorded; carries the raw sleep payload.
    SleepCreated(Value),
    /// Any other event type; acknowledged without processing.
    Ignored,
}

/// Classifies a verified event by its type discriminator.
///
/// Pure function: unknown, missing, or malformed discriminators are ignored
/// rather than rejected (forward compatibility with new provider events).
pub fn classify(event: &ProviderEvent) -> EventKind {
    if event.event_type == SLEEP_CREATED_EVENT {
        EventKind::SleepCreated(event.data.clone())
    } else {
        EventKind::Ignored
    }
}
