//! Siesta HTTP API.
//!
//! Exposes the signed sleep webhook endpoint plus health routes, backed by
//! the evaluation logic in `siesta-core` and the reschedule machinery in
//! `siesta-dispatch`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod server;
pub mod state;

pub use config::{Config, Environment};
pub use crypto::{SignatureHeaders, WebhookVerifier};
pub use server::{create_router, shutdown_signal, start_server};
pub use state::AppState;
