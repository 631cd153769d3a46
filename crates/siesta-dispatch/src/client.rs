//! HTTP client for the external booking system.
//!
//! Implements the booking lookup and reschedule seams over the booking
//! system's REST API with connection pooling, bearer auth, and configurable
//! timeouts. HTTP failures are categorized for logging; retry is the
//! reschedule subsystem's own responsibility and is not attempted here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use siesta_core::{Booking, BookingRepository, BookingStatus, BookingUid, Rescheduler, SiestaError};
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Configuration for the booking-system client.
#[derive(Debug, Clone)]
pub struct BookingClientConfig {
    /// Base URL of the booking API, without trailing slash.
    pub base_url: String,
    /// Bearer token for the booking API.
    pub api_token: String,
    /// Timeout applied to each request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for BookingClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            api_token: String::new(),
            timeout: Duration::from_secs(crate::DEFAULT_REQUEST_TIMEOUT_SECONDS),
            user_agent: "Siesta-Reschedule/1.0".to_string(),
        }
    }
}

/// Wire shape of the booking list response.
#[derive(Debug, Deserialize)]
struct BookingsEnvelope {
    bookings: Vec<BookingRecord>,
}

#[derive(Debug, Deserialize)]
struct BookingRecord {
    id: i64,
    uid: String,
    status: BookingStatus,
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        Self { id: record.id.into(), uid: BookingUid::new(record.uid), status: record.status }
    }
}

/// HTTP-backed implementation of the booking seams.
///
/// One long-lived instance is constructed at startup and injected into the
/// request-handling state; it is never a module-global singleton.
#[derive(Debug, Clone)]
pub struct BookingApiClient {
    client: reqwest::Client,
    config: BookingClientConfig,
}

impl BookingApiClient {
    /// Creates a new booking client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the HTTP client cannot be
    /// built with the provided settings.
    pub fn new(config: BookingClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DispatchError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Creates a new booking client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(BookingClientConfig::default())
    }

    fn categorize(&self, error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            return DispatchError::timeout(self.config.timeout.as_secs());
        }
        if error.is_connect() {
            return DispatchError::network(format!("connection failed: {error}"));
        }
        DispatchError::network(error.to_string())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(DispatchError::client_error(code, body))
        } else {
            Err(DispatchError::server_error(code, body))
        }
    }
}

#[async_trait]
impl BookingRepository for BookingApiClient {
    async fn find_active_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> siesta_core::Result<Vec<Booking>> {
        let url = format!("{}/bookings", self.config.base_url);

        debug!(from = %start, to = %end, "querying active bookings");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .query(&[
                ("from", start.to_rfc3339()),
                ("to", end.to_rfc3339()),
                ("status", BookingStatus::Accepted.as_str().to_string()),
                ("status", BookingStatus::Pending.as_str().to_string()),
            ])
            .send()
            .await
            .map_err(|e| SiestaError::BookingLookup(self.categorize(e).to_string()))?;

        let response = Self::check_status(response)
            .await
            .map_err(|e| SiestaError::BookingLookup(e.to_string()))?;

        let envelope: BookingsEnvelope = response
            .json()
            .await
            .map_err(|e| SiestaError::BookingLookup(DispatchError::malformed(e.to_string()).to_string()))?;

        Ok(envelope.bookings.into_iter().map(Booking::from).collect())
    }
}

#[async_trait]
impl Rescheduler for BookingApiClient {
    async fn reschedule(&self, booking_uid: &BookingUid, reason: &str) -> siesta_core::Result<()> {
        let url = format!("{}/bookings/{}/reschedule", self.config.base_url, booking_uid);

        debug!(booking_uid = %booking_uid, "requesting reschedule");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({ "reason": reason }))
            .send()
            .await
            .map_err(|e| SiestaError::Reschedule(self.categorize(e).to_string()))?;

        Self::check_status(response).await.map_err(|e| SiestaError::Reschedule(e.to_string()))?;

        Ok(())
    }
}
