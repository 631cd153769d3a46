//! HTTP request handlers for the siesta API.

pub mod health;
pub mod webhook;

pub use health::{health_check, liveness_check};
pub use webhook::receive_sleep_webhook;
