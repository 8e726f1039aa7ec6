//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: one product, one
//! line item, and a redirect URL handed back to the browser.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency, RequestStrategy,
};

use crate::config::{PaymentsConfig, StripeConfig};
use crate::error::{PaymentError, Result};

/// Metadata key carrying the storefront product id through Stripe
pub const PRODUCT_ID_METADATA_KEY: &str = "product_id";

/// Product the buyer wants to pay for, as posted by the frontend
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescriptor {
    /// Display name shown on the Stripe page
    pub title: String,

    /// Price in the currency's minor unit
    pub amount_cents: i64,

    /// ISO 4217 code, e.g. "usd"
    pub currency: String,

    /// Storefront identifier (string or number)
    #[serde(default)]
    pub id: serde_json::Value,
}

impl ProductDescriptor {
    /// Reject descriptors Stripe would refuse anyway
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PaymentError::InvalidProduct("title is empty".into()));
        }
        if self.amount_cents <= 0 {
            return Err(PaymentError::InvalidProduct(format!(
                "amountCents must be positive, got {}",
                self.amount_cents
            )));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::InvalidProduct(format!(
                "currency must be a three-letter ISO code, got {:?}",
                self.currency
            )));
        }
        Ok(())
    }

    /// Product id flattened to a string for Stripe metadata
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A single priced line on the checkout page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub currency: String,
    pub unit_amount: i64,
    pub quantity: u64,
}

/// Provider-neutral request for a one-off card payment session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,

    /// Forwarded to Stripe so retried requests reuse the same session
    pub idempotency_key: Option<String>,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,

    /// URL to redirect user to
    pub url: String,
}

/// Payment provider port.
///
/// `StripeClient` talks to the real API; `MockPaymentProvider` records calls.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Result<CheckoutSession>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    pub fn from_config(config: &StripeConfig) -> Self {
        Self::new(&config.secret_key)
    }

    /// Get the underlying Stripe client
    pub const fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Result<CheckoutSession> {
        let mut line_items = Vec::with_capacity(params.line_items.len());
        for item in &params.line_items {
            line_items.push(CreateCheckoutSessionLineItems {
                quantity: Some(item.quantity),
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency: parse_currency(&item.currency)?,
                    unit_amount: Some(item.unit_amount),
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: item.name.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }

        let mut create = CreateCheckoutSession::new();
        create.mode = Some(CheckoutSessionMode::Payment);
        create.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        create.success_url = Some(params.success_url.as_str());
        create.cancel_url = Some(params.cancel_url.as_str());
        create.line_items = Some(line_items);
        if !params.metadata.is_empty() {
            create.metadata = Some(params.metadata.clone());
        }

        let client = match &params.idempotency_key {
            Some(key) => self
                .client
                .clone()
                .with_strategy(RequestStrategy::Idempotent(key.clone())),
            None => self.client.clone(),
        };

        let session = StripeCheckoutSession::create(&client, create)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Stripe's `Currency` only deserializes from its lowercase wire form
fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_ascii_lowercase()))
        .map_err(|_| PaymentError::InvalidProduct(format!("unsupported currency {code:?}")))
}

/// Turns a product into a single-item checkout session
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
    success_url: String,
    cancel_url: String,
}

impl CheckoutService {
    pub fn new(provider: Arc<dyn PaymentProvider>, config: &PaymentsConfig) -> Self {
        Self {
            provider,
            success_url: config.success_url(),
            cancel_url: config.cancel_url(),
        }
    }

    /// Build the session request for `product`: one line item, quantity 1,
    /// amount and currency copied verbatim.
    pub fn session_params(
        &self,
        product: &ProductDescriptor,
        idempotency_key: Option<String>,
    ) -> Result<CheckoutSessionParams> {
        product.validate()?;

        let mut metadata = HashMap::new();
        if let Some(id) = product.id_string() {
            metadata.insert(PRODUCT_ID_METADATA_KEY.to_string(), id);
        }

        Ok(CheckoutSessionParams {
            line_items: vec![LineItem {
                name: product.title.clone(),
                currency: product.currency.clone(),
                unit_amount: product.amount_cents,
                quantity: 1,
            }],
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            metadata,
            idempotency_key,
        })
    }

    /// Create a hosted checkout session for `product`
    pub async fn create_session(
        &self,
        product: &ProductDescriptor,
        idempotency_key: Option<String>,
    ) -> Result<CheckoutSession> {
        let params = self.session_params(product, idempotency_key)?;

        let session = self.provider.create_checkout_session(params).await?;

        tracing::info!(
            provider = self.provider.name(),
            session_id = %session.id,
            product_id = ?product.id_string(),
            amount_cents = product.amount_cents,
            currency = %product.currency,
            "Created checkout session"
        );

        Ok(session)
    }
}
