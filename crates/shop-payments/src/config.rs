//! Payments Configuration
//!
//! Loaded once at process start and handed to the services that need it.

use crate::error::{PaymentError, Result};

/// Stripe's own SDKs reject events signed more than five minutes away from now.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Used when `APP_URL` is not set.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Stripe credentials
#[derive(Clone)]
pub struct StripeConfig {
    /// API secret key (`sk_...`)
    pub secret_key: String,

    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}

impl StripeConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        Ok(Self {
            secret_key,
            webhook_secret,
        })
    }
}

/// Everything the checkout and webhook endpoints read from the environment
#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    /// Public base URL of the storefront, without trailing slash
    pub app_url: String,

    /// Stripe credentials (None = payments disabled)
    pub stripe: Option<StripeConfig>,

    /// Accepted clock difference for webhook signatures
    pub webhook_tolerance_secs: i64,
}

impl PaymentsConfig {
    pub fn new(app_url: impl Into<String>, stripe: Option<StripeConfig>) -> Self {
        Self {
            app_url: normalize_app_url(&app_url.into()),
            stripe,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }

    /// Create from environment variables.
    ///
    /// Missing Stripe credentials leave payments disabled rather than failing.
    pub fn from_env() -> Result<Self> {
        let app_url = std::env::var("APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.into());

        let stripe = match StripeConfig::from_env() {
            Ok(stripe) => Some(stripe),
            Err(e) => {
                tracing::debug!(error = %e, "Stripe credentials incomplete");
                None
            }
        };

        let webhook_tolerance_secs = match std::env::var("STRIPE_WEBHOOK_TOLERANCE_SECS") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                PaymentError::Config(format!("STRIPE_WEBHOOK_TOLERANCE_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_WEBHOOK_TOLERANCE_SECS,
        };

        Ok(Self {
            webhook_tolerance_secs,
            ..Self::new(app_url, stripe)
        })
    }

    /// Where Stripe sends the buyer after paying. `{CHECKOUT_SESSION_ID}` is
    /// substituted by Stripe.
    pub fn success_url(&self) -> String {
        format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", self.app_url)
    }

    /// Where Stripe sends the buyer after abandoning checkout
    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.app_url)
    }

    pub const fn payments_enabled(&self) -> bool {
        self.stripe.is_some()
    }
}

fn normalize_app_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
