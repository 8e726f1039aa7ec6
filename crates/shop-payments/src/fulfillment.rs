//! Order Fulfillment Hook
//!
//! Called once per completed checkout session. Recording the purchase and
//! emailing a download link are not built yet; the default hook only logs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The parts of a `checkout.session.completed` event fulfillment needs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedCheckout {
    /// Webhook event id, the idempotency key
    pub event_id: String,

    /// Checkout session id (`cs_...`)
    pub session_id: String,

    /// Storefront product id carried in session metadata
    pub product_id: Option<String>,

    pub customer_email: Option<String>,

    /// Total charged, minor units
    pub amount_total: Option<i64>,

    pub currency: Option<String>,

    /// `paid`, `unpaid` or `no_payment_required`
    pub payment_status: Option<String>,
}

/// Fulfillment strategy
#[async_trait]
pub trait Fulfiller: Send + Sync {
    /// Deliver the order. An error makes the webhook answer 5xx so Stripe retries.
    async fn fulfill(&self, checkout: &CompletedCheckout) -> Result<()>;
}

/// Default fulfiller: logs the completed checkout and does nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingFulfiller;

#[async_trait]
impl Fulfiller for LoggingFulfiller {
    async fn fulfill(&self, checkout: &CompletedCheckout) -> Result<()> {
        tracing::info!(
            event_id = %checkout.event_id,
            session_id = %checkout.session_id,
            product_id = ?checkout.product_id,
            email = ?checkout.customer_email,
            amount_total = ?checkout.amount_total,
            currency = ?checkout.currency,
            payment_status = ?checkout.payment_status,
            "Checkout completed"
        );

        // TODO: persist a purchase record and email a signed download link
        // once the purchase schema and link signing scheme exist.
        tracing::warn!(session_id = %checkout.session_id, "Order fulfillment not implemented");

        Ok(())
    }
}
