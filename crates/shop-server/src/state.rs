//! Application State

use std::sync::Arc;

use shop_payments::{
    CheckoutService, EventLedger, Fulfiller, LoggingFulfiller, MemoryEventLedger, PaymentProvider,
    PaymentsConfig, StripeClient, WebhookHandler, WebhookVerifier,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout session creator (None if Stripe is not configured)
    pub checkout: Option<Arc<CheckoutService>>,

    /// Webhook receiver (None if Stripe is not configured)
    pub webhooks: Option<Arc<WebhookHandler>>,
}

impl AppState {
    /// Wire the services from explicit parts.
    ///
    /// Payments stay disabled unless `config.stripe` is set, since the
    /// webhook secret lives there.
    pub fn new(
        config: &PaymentsConfig,
        provider: Arc<dyn PaymentProvider>,
        ledger: Arc<dyn EventLedger>,
        fulfiller: Arc<dyn Fulfiller>,
    ) -> Self {
        let Some(stripe) = &config.stripe else {
            return Self::disabled();
        };

        let verifier = WebhookVerifier::new(stripe.webhook_secret.clone(), config.webhook_tolerance_secs);

        Self {
            checkout: Some(Arc::new(CheckoutService::new(provider, config))),
            webhooks: Some(Arc::new(WebhookHandler::new(verifier, ledger, fulfiller))),
        }
    }

    /// Production wiring: real Stripe client, in-memory ledger, logging fulfiller
    pub fn from_config(config: &PaymentsConfig) -> Self {
        let Some(stripe) = &config.stripe else {
            return Self::disabled();
        };

        Self::new(
            config,
            Arc::new(StripeClient::from_config(stripe)),
            Arc::new(MemoryEventLedger::new()),
            Arc::new(LoggingFulfiller),
        )
    }

    /// State with every payment route answering 503
    pub const fn disabled() -> Self {
        Self {
            checkout: None,
            webhooks: None,
        }
    }

    pub const fn stripe_configured(&self) -> bool {
        self.checkout.is_some()
    }
}
