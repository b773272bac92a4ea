//! Webhook signature verification.
//!
//! The identity provider signs each delivery with HMAC-SHA256 over
//! `"{id}.{timestamp}.{body}"` and sends the result base64-encoded in a
//! signature header alongside the message id and a unix-seconds
//! timestamp. The signing secret is itself base64, optionally prefixed
//! with `whsec_`.
//!
//! The signature header may carry several space-separated entries of the
//! form `v1,<base64>` (the provider rotates secrets by signing with more
//! than one); verification succeeds when any `v1` entry matches.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the delivery timestamp and local time.
pub const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// The configured signing secret could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("webhook signing secret is not valid base64")]
pub struct SecretError;

/// Reasons a delivery fails verification.
///
/// All variants map to a client error at the HTTP boundary; the split
/// exists for logs, not for response selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The timestamp header is not a unix-seconds integer.
    #[error("webhook timestamp is malformed")]
    MalformedTimestamp,

    /// The timestamp lies outside the accepted tolerance window.
    #[error("webhook timestamp is outside the accepted tolerance")]
    StaleTimestamp,

    /// No signature entry matched the computed digest.
    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Verifier holding the decoded signing key.
pub struct WebhookVerifier {
    key: Zeroizing<Vec<u8>>,
}

impl WebhookVerifier {
    /// Decode the configured secret into a signing key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError`] when the secret (after the optional
    /// `whsec_` prefix) is not valid base64.
    pub fn new(secret: &str) -> Result<Self, SecretError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64.decode(encoded).map_err(|_| SecretError)?;
        Ok(Self {
            key: Zeroizing::new(key),
        })
    }

    /// Verify one delivery against the raw request body.
    ///
    /// `now` is injected so the tolerance window is testable.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the timestamp is malformed or
    /// stale, or when no signature entry matches.
    pub fn verify(
        &self,
        message_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let issued_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::MalformedTimestamp)?;
        // checked_sub: the header is attacker-controlled, so the skew can
        // overflow i64 for timestamps near the type bounds.
        let in_tolerance = now
            .timestamp()
            .checked_sub(issued_at)
            .is_some_and(|skew| {
                (-TIMESTAMP_TOLERANCE_SECONDS..=TIMESTAMP_TOLERANCE_SECONDS).contains(&skew)
            });
        if !in_tolerance {
            return Err(SignatureError::StaleTimestamp);
        }

        for entry in signature_header.split(' ') {
            let Some((version, encoded)) = entry.split_once(',') else {
                continue;
            };
            if version != SIGNATURE_VERSION {
                continue;
            }
            let Ok(candidate) = BASE64.decode(encoded) else {
                continue;
            };
            if self.entry_matches(message_id, timestamp, body, &candidate) {
                return Ok(());
            }
        }
        Err(SignatureError::Mismatch)
    }

    /// Constant-time comparison of one candidate signature.
    fn entry_matches(
        &self,
        message_id: &str,
        timestamp: &str,
        body: &[u8],
        candidate: &[u8],
    ) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            // HMAC accepts keys of any length; this arm is unreachable.
            return false;
        };
        mac.update(message_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.verify_slice(candidate).is_ok()
    }
}

/// Produce a valid signature header entry for the given delivery.
///
/// Test-only helper mirroring the provider's signing side.
#[cfg(test)]
pub fn sign(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> String {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    let key = BASE64.decode(encoded).expect("test secret is base64");
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(format!("{message_id}.{timestamp}.").as_bytes());
    mac.update(body);
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}
