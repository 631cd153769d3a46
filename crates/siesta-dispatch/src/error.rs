//! Error types for booking-system operations.
//!
//! Covers network failures, HTTP errors, and task-level failures seen while
//! talking to the booking system. Variants carry enough context for logging;
//! none of them propagate past the webhook handler's recovery boundary.

use thiserror::Error;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Error types for booking lookup and reschedule calls.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure.
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Number of seconds before the request timed out.
        timeout_seconds: u64,
    },

    /// HTTP response indicated client error (4xx).
    #[error("client error: HTTP {status_code}")]
    ClientError {
        /// HTTP status code (4xx).
        status_code: u16,
        /// Response body content.
        body: String,
    },

    /// HTTP response indicated server error (5xx).
    #[error("server error: HTTP {status_code}")]
    ServerError {
        /// HTTP status code (5xx).
        status_code: u16,
        /// Response body content.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// Decode error message.
        message: String,
    },

    /// Invalid client configuration.
    #[error("invalid client configuration: {message}")]
    Configuration {
        /// Configuration error message.
        message: String,
    },
}

impl DispatchError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a client error from an HTTP response.
    pub fn client_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ClientError { status_code, body: body.into() }
    }

    /// Creates a server error from an HTTP response.
    pub fn server_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ServerError { status_code, body: body.into() }
    }

    /// Creates a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_format() {
        assert_eq!(DispatchError::timeout(30).to_string(), "request timeout after 30s");
        assert_eq!(
            DispatchError::server_error(503, "unavailable").to_string(),
            "server error: HTTP 503"
        );
        assert_eq!(
            DispatchError::network("connection refused").to_string(),
            "network connection failed: connection refused"
        );
    }
}
