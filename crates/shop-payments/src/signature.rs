//! Stripe Webhook Signature Verification
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 using the
//! endpoint's signing secret and sends the result in the `stripe-signature`
//! header as `t=<unix>,v1=<hex>[,v1=<hex>...]`. Several `v1` entries appear
//! while a secret is being rolled; any one of them matching is enough.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Parsed `stripe-signature` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Decoded `v1` signatures. Entries that are not valid hex are dropped.
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(WebhookError::MissingHeader);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();
        let mut saw_v1 = false;

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(WebhookError::Header(format!("expected key=value, got {part:?}")));
            };

            match key {
                "t" => {
                    let t = value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::Header(format!("invalid timestamp {value:?}")))?;
                    timestamp = Some(t);
                }
                "v1" => {
                    saw_v1 = true;
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                // v0 and future schemes
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| WebhookError::Header("missing timestamp".into()))?;
        if !saw_v1 {
            return Err(WebhookError::Header("no v1 signature".into()));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Checks webhook payloads against the endpoint signing secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// `tolerance_secs <= 0` disables the timestamp check.
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Verify against the current wall clock
    pub fn verify(&self, payload: &str, header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    /// Verify as if the current time were `now` (unix seconds)
    pub fn verify_at(&self, payload: &str, header: &str, now: i64) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(header)?;
        let mac = self.mac(header.timestamp, payload)?;

        let matched = header
            .signatures
            .iter()
            .any(|sig| mac.clone().verify_slice(sig).is_ok());
        if !matched {
            return Err(WebhookError::SignatureMismatch);
        }

        if self.tolerance_secs > 0 && now.abs_diff(header.timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(WebhookError::Timestamp {
                timestamp: header.timestamp,
                tolerance_secs: self.tolerance_secs,
            });
        }

        Ok(())
    }

    /// Produce a `stripe-signature` header value for `payload`.
    ///
    /// Used by tests and for replaying captured events locally.
    pub fn sign(&self, payload: &str, timestamp: i64) -> Result<String, WebhookError> {
        let digest = self.mac(timestamp, payload)?.finalize().into_bytes();
        Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
    }

    fn mac(&self, timestamp: i64, payload: &str) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::Header("unusable signing secret".into()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}
