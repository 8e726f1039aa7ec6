//! Stripe Webhook Handling
//!
//! Verifies signed callbacks and reacts to completed checkout sessions.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::checkout::PRODUCT_ID_METADATA_KEY;
use crate::error::{PaymentError, Result, WebhookError};
use crate::fulfillment::{CompletedCheckout, Fulfiller};
use crate::ledger::EventLedger;
use crate::signature::WebhookVerifier;

/// Event type that triggers fulfillment
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Event envelope as Stripe sends it
#[derive(Clone, Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub livemode: bool,

    /// Absent on some event types; only checkout events need it
    #[serde(default)]
    pub data: EventData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub object: serde_json::Value,
}

/// The checkout session fields we read
#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed - fulfil the order
    CheckoutCompleted(CompletedCheckout),

    /// Any other event type, acknowledged and ignored
    Other { event_id: String, event_type: String },
}

/// What the handler did with an event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Fulfillment hook ran
    Fulfilled { event_id: String, session_id: String },

    /// Event id seen before; skipped
    Duplicate { event_id: String },

    /// Event type we do not act on
    Ignored { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler {
    verifier: WebhookVerifier,
    ledger: Arc<dyn EventLedger>,
    fulfiller: Arc<dyn Fulfiller>,
}

impl WebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        ledger: Arc<dyn EventLedger>,
        fulfiller: Arc<dyn Fulfiller>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            fulfiller,
        }
    }

    /// Verify the signature over the exact raw body, then parse the event.
    pub fn construct_event(&self, payload: &str, signature: &str) -> std::result::Result<WebhookEvent, WebhookError> {
        self.verifier.verify(payload, signature)?;

        let event: StripeEvent =
            serde_json::from_str(payload).map_err(|e| WebhookError::Payload(e.to_string()))?;

        parse_webhook_event(event)
    }

    /// Process a verified event
    pub async fn handle(&self, event: WebhookEvent) -> Result<WebhookOutcome> {
        match event {
            WebhookEvent::CheckoutCompleted(checkout) => {
                if !self.ledger.claim(&checkout.event_id, CHECKOUT_SESSION_COMPLETED)? {
                    tracing::info!(
                        event_id = %checkout.event_id,
                        session_id = %checkout.session_id,
                        "Duplicate webhook delivery, skipping"
                    );
                    return Ok(WebhookOutcome::Duplicate {
                        event_id: checkout.event_id,
                    });
                }

                if let Err(e) = self.fulfiller.fulfill(&checkout).await {
                    self.ledger.release(&checkout.event_id)?;
                    return Err(match e {
                        e @ PaymentError::Fulfillment(_) => e,
                        other => PaymentError::Fulfillment(other.to_string()),
                    });
                }

                Ok(WebhookOutcome::Fulfilled {
                    event_id: checkout.event_id,
                    session_id: checkout.session_id,
                })
            }

            WebhookEvent::Other { event_id, event_type } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Unhandled webhook event");
                Ok(WebhookOutcome::Ignored { event_type })
            }
        }
    }
}

/// Parse Stripe event into our event type
fn parse_webhook_event(event: StripeEvent) -> std::result::Result<WebhookEvent, WebhookError> {
    if event.type_ != CHECKOUT_SESSION_COMPLETED {
        return Ok(WebhookEvent::Other {
            event_id: event.id,
            event_type: event.type_,
        });
    }

    let session: SessionObject = serde_json::from_value(event.data.object)
        .map_err(|e| WebhookError::Payload(format!("invalid checkout session data: {e}")))?;

    let customer_email = session
        .customer_details
        .and_then(|d| d.email)
        .or(session.customer_email);

    Ok(WebhookEvent::CheckoutCompleted(CompletedCheckout {
        event_id: event.id,
        session_id: session.id,
        product_id: session
            .metadata
            .and_then(|mut m| m.remove(PRODUCT_ID_METADATA_KEY)),
        customer_email,
        amount_total: session.amount_total,
        currency: session.currency,
        payment_status: session.payment_status,
    }))
}
