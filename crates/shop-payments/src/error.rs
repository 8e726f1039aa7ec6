//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error (upstream failure)
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Product descriptor rejected before reaching Stripe
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Fulfillment hook failed for a completed checkout
    #[error("Fulfillment failed: {0}")]
    Fulfillment(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Stripe(_) | Self::Fulfillment(_) | Self::Storage(_)
        )
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Stripe(_) => "Payment provider is unavailable. Please try again in a moment.",
            Self::InvalidProduct(_) => "The selected product cannot be purchased.",
            Self::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

/// Webhook verification errors.
///
/// All of these surface to the caller as the same opaque `400 Webhook error`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing stripe-signature header")]
    MissingHeader,

    #[error("malformed signature header: {0}")]
    Header(String),

    #[error("timestamp {timestamp} outside tolerance of {tolerance_secs}s")]
    Timestamp { timestamp: i64, tolerance_secs: i64 },

    #[error("no signature matched the payload")]
    SignatureMismatch,

    #[error("invalid event payload: {0}")]
    Payload(String),
}
