//! Mock Payment Provider
//!
//! For tests and local demos. Records every request and hands back fake
//! hosted-checkout URLs.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::checkout::{CheckoutSession, CheckoutSessionParams, PaymentProvider};
use crate::error::{PaymentError, Result};

/// Mock provider that never leaves the process
pub struct MockPaymentProvider {
    requests: Mutex<Vec<CheckoutSessionParams>>,
    sessions: Mutex<Vec<CheckoutSession>>,
    counter: AtomicU64,
    /// When set, every call fails with this Stripe error
    failure: Option<String>,
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            failure: None,
        }
    }

    /// Create a provider whose calls all fail (for upstream-error paths)
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Every request received so far, oldest first
    pub async fn requests(&self) -> Vec<CheckoutSessionParams> {
        self.requests.lock().await.clone()
    }

    /// URL of the most recently created session
    pub async fn last_url(&self) -> Option<String> {
        self.sessions.lock().await.last().map(|s| s.url.clone())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Result<CheckoutSession> {
        self.requests.lock().await.push(params);

        if let Some(message) = &self.failure {
            return Err(PaymentError::Stripe(message.clone()));
        }

        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("cs_test_mock_{n:04}");
        let session = CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
        };

        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
