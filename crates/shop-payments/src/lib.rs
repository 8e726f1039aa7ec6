//! # shop-payments
//!
//! Stripe checkout and webhook handling for the storefront.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  POST /api/checkout  ┌─────────────────┐     ┌─────────────┐
//! │  Storefront │─────────────────────▶│  Stripe Hosted  │────▶│  /success   │
//! │  (product)  │◀──── { url } ────────│  Checkout Page  │     │  /cancel    │
//! └─────────────┘                      └────────┬────────┘     └─────────────┘
//!                                               │ checkout.session.completed
//!                                               ▼
//!                                  POST /api/checkout/webhook
//!                                  verify → ledger claim → fulfil
//! ```
//!
//! - [`CheckoutService`] turns a [`ProductDescriptor`] into a single line
//!   item session through any [`PaymentProvider`] ([`StripeClient`] in
//!   production, [`MockPaymentProvider`] in tests).
//! - [`WebhookHandler`] checks the `stripe-signature` header with
//!   [`WebhookVerifier`], then runs the [`Fulfiller`] at most once per event
//!   id, tracked by an [`EventLedger`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shop_payments::{CheckoutService, PaymentsConfig, ProductDescriptor, StripeClient};
//!
//! let config = PaymentsConfig::from_env()?;
//! let stripe = StripeClient::from_config(config.stripe.as_ref().unwrap());
//! let checkout = CheckoutService::new(Arc::new(stripe), &config);
//!
//! let session = checkout.create_session(&product, None).await?;
//! // Redirect user to: session.url
//! ```

mod checkout;
mod config;
mod error;
mod fulfillment;
mod ledger;
mod mock;
mod signature;
mod webhook;

pub use checkout::{
    CheckoutService, CheckoutSession, CheckoutSessionParams, LineItem, PRODUCT_ID_METADATA_KEY,
    PaymentProvider, ProductDescriptor, StripeClient,
};
pub use config::{DEFAULT_APP_URL, DEFAULT_WEBHOOK_TOLERANCE_SECS, PaymentsConfig, StripeConfig};
pub use error::{PaymentError, Result, WebhookError};
pub use fulfillment::{CompletedCheckout, Fulfiller, LoggingFulfiller};
pub use ledger::{DEFAULT_RETENTION_HOURS, EventLedger, MemoryEventLedger, ProcessedEvent};
pub use mock::MockPaymentProvider;
pub use signature::{SIGNATURE_HEADER, SignatureHeader, WebhookVerifier};
pub use webhook::{CHECKOUT_SESSION_COMPLETED, StripeEvent, WebhookEvent, WebhookHandler, WebhookOutcome};
