//! Siesta sleep webhook service.
//!
//! Main entry point for the siesta server. Initializes all subsystems
//! and coordinates graceful startup and shutdown.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use siesta_api::{AppState, Config, WebhookVerifier};
use siesta_core::{BookingRepository, RealClock, Rescheduler};
use siesta_dispatch::{BookingApiClient, RescheduleDispatcher};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with structured logging
    init_tracing();

    info!("Starting siesta sleep webhook service");

    // Load configuration from defaults, config file, and environment
    let config = Config::load()?;
    info!(
        environment = %config.environment,
        webhook_secret = %config.webhook_secret_masked(),
        booking_api_url = %config.booking_api_url,
        reschedule_max_concurrency = config.reschedule_max_concurrency,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;

    // Wire up collaborators: one HTTP client serves both the booking lookup
    // and the reschedule dispatch.
    let verifier =
        WebhookVerifier::new(&config.webhook_secret).context("Invalid webhook signing secret")?;
    let client = Arc::new(
        BookingApiClient::new(config.to_booking_client_config())
            .context("Failed to create booking API client")?,
    );
    let rescheduler: Arc<dyn Rescheduler> = client.clone();
    let bookings: Arc<dyn BookingRepository> = client;
    let dispatcher = Arc::new(RescheduleDispatcher::new(rescheduler, config.to_dispatch_config()));

    let state = AppState::new(
        Arc::new(config),
        Arc::new(verifier),
        bookings,
        dispatcher,
        Arc::new(RealClock::new()),
    );

    // Start HTTP server
    let server_handle = tokio::spawn(async move {
        if let Err(e) = siesta_api::start_server(state, addr).await {
            error!(error = %e, "Server failed");
        }
    });

    info!(addr = %addr, "Siesta is ready to receive webhooks");

    // Wait for shutdown signal
    siesta_api::shutdown_signal().await;
    info!("Shutdown signal received, starting graceful shutdown");

    // Give in-flight requests time to complete
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(30)) => {
            info!("Shutdown grace period expired");
        }
        _ = server_handle => {
            info!("Server stopped");
        }
    }

    info!("Siesta shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,siesta=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
