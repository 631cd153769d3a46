//! Cryptographic utilities for webhook signature verification.
//!
//! This module implements the svix signing scheme used by the health-data
//! provider: HMAC-SHA256 over `{id}.{timestamp}.{body}`, transmitted as a
//! space-separated list of `v1,<base64>` entries in the `svix-signature`
//! header.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the message id that was signed.
pub const ID_HEADER: &str = "svix-id";
/// Header carrying the unix-seconds timestamp that was signed.
pub const TIMESTAMP_HEADER: &str = "svix-timestamp";
/// Header carrying the signature entries.
pub const SIGNATURE_HEADER: &str = "svix-signature";

/// Maximum accepted clock skew between sender and receiver, in seconds.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 5 * 60;

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Missing or empty signature header.
    MissingSignature,
    /// Malformed signature material.
    InvalidFormat(String),
    /// Signed timestamp is too far from the receiver's clock.
    TimestampOutOfTolerance {
        /// Observed skew in seconds.
        skew_seconds: i64,
    },
    /// No signature entry matched the expected HMAC.
    VerificationFailed,
    /// Invalid signing secret.
    InvalidSecret,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSignature => write!(f, "signature header missing"),
            Self::InvalidFormat(detail) => write!(f, "invalid signature format: {detail}"),
            Self::TimestampOutOfTolerance { skew_seconds } => {
                write!(f, "signed timestamp outside tolerance: skew of {skew_seconds}s")
            }
            Self::VerificationFailed => write!(f, "signature verification failed"),
            Self::InvalidSecret => write!(f, "invalid signing secret"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Signature material extracted from the inbound request headers.
#[derive(Debug, Clone, Copy)]
pub struct SignatureHeaders<'a> {
    /// Value of `svix-id`.
    pub id: &'a str,
    /// Value of `svix-timestamp`.
    pub timestamp: &'a str,
    /// Value of `svix-signature`.
    pub signature: &'a str,
}

/// Verifies svix-style webhook signatures against a shared secret.
///
/// Secrets are accepted either as `whsec_<base64>` (the provider's portal
/// format, decoded before use) or as a raw byte string.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_seconds: i64,
}

impl WebhookVerifier {
    /// Creates a verifier from the configured signing secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the secret is empty or the
    /// `whsec_` payload is not valid base64.
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        if secret.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        let key = match secret.strip_prefix("whsec_") {
            Some(encoded) => BASE64.decode(encoded).map_err(|_| SignatureError::InvalidSecret)?,
            None => secret.as_bytes().to_vec(),
        };
        Ok(Self { key, tolerance_seconds: DEFAULT_TOLERANCE_SECONDS })
    }

    /// Overrides the accepted clock skew.
    #[must_use]
    pub fn with_tolerance_seconds(mut self, tolerance_seconds: i64) -> Self {
        self.tolerance_seconds = tolerance_seconds;
        self
    }

    /// Signs a payload, returning a complete `v1,<base64>` header value.
    ///
    /// The signed content is `{id}.{timestamp}.{body}` per the svix scheme.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the key cannot be used.
    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
        Ok(format!("v1,{}", self.compute(id, timestamp, payload)?))
    }

    /// Verifies the payload against the signature headers.
    ///
    /// Accepts the request if any `v1,` entry in the signature header matches
    /// the expected HMAC; entries with other version prefixes are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first verification failure encountered: missing material,
    /// malformed timestamp, excessive clock skew, or no matching entry.
    pub fn verify(
        &self,
        payload: &[u8],
        headers: &SignatureHeaders<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        if headers.signature.trim().is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        if headers.id.is_empty() {
            return Err(SignatureError::InvalidFormat("message id header is empty".into()));
        }

        let timestamp: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidFormat("timestamp is not unix seconds".into()))?;
        let skew_seconds = (now.timestamp() - timestamp).abs();
        if skew_seconds > self.tolerance_seconds {
            return Err(SignatureError::TimestampOutOfTolerance { skew_seconds });
        }

        let expected = self.compute(headers.id, timestamp, payload)?;
        for entry in headers.signature.split_whitespace() {
            let Some(candidate) = entry.strip_prefix("v1,") else {
                continue;
            };
            if timing_safe_eq(candidate, &expected) {
                return Ok(());
            }
        }
        Err(SignatureError::VerificationFailed)
    }

    fn compute(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Timing-safe string comparison to prevent timing attacks.
///
/// Uses constant-time comparison to avoid leaking information
/// about the expected signature through timing analysis.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut result = 0u8;
    for (a_byte, b_byte) in a_bytes.iter().zip(b_bytes.iter()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new("test-signing-secret").unwrap()
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let v = verifier();
        let now = Utc::now();
        let payload = b"{\"event_type\":\"daily.data.sleep.created\"}";

        let timestamp = now.timestamp().to_string();
        let signature = v.sign("msg_1", now.timestamp(), payload).unwrap();
        let headers =
            SignatureHeaders { id: "msg_1", timestamp: &timestamp, signature: &signature };

        assert!(v.verify(payload, &headers, now).is_ok());
    }

    #[test]
    fn tampered_payload_fails() {
        let v = verifier();
        let now = Utc::now();
        let timestamp = now.timestamp().to_string();
        let signature = v.sign("msg_1", now.timestamp(), b"original").unwrap();
        let headers =
            SignatureHeaders { id: "msg_1", timestamp: &timestamp, signature: &signature };

        assert_eq!(v.verify(b"tampered", &headers, now), Err(SignatureError::VerificationFailed));
    }

    #[test]
    fn empty_signature_is_missing() {
        let v = verifier();
        let now = Utc::now();
        let timestamp = now.timestamp().to_string();
        let headers = SignatureHeaders { id: "msg_1", timestamp: &timestamp, signature: "  " };

        assert_eq!(v.verify(b"{}", &headers, now), Err(SignatureError::MissingSignature));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(WebhookVerifier::new("").unwrap_err(), SignatureError::InvalidSecret);
    }

    #[test]
    fn malformed_whsec_secret_is_rejected() {
        assert_eq!(
            WebhookVerifier::new("whsec_!!!not-base64!!!").unwrap_err(),
            SignatureError::InvalidSecret
        );
    }

    #[test]
    fn timing_safe_eq_same() {
        assert!(timing_safe_eq("hello", "hello"));
    }

    #[test]
    fn timing_safe_eq_different() {
        assert!(!timing_safe_eq("hello", "world"));
    }

    #[test]
    fn timing_safe_eq_different_length() {
        assert!(!timing_safe_eq("hello", "hello_world"));
    }
}
