//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use shop_payments::{PaymentError, ProductDescriptor, SIGNATURE_HEADER, WebhookOutcome};

use crate::state::AppState;

/// Optional header forwarded to Stripe to deduplicate retried checkouts
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Body of every rejected webhook, whatever the cause
pub const WEBHOOK_ERROR_BODY: &str = "Webhook error";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    fn with_status(status: StatusCode, error: impl Into<String>, code: &str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: error.into(),
                code: code.into(),
            }),
        )
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product: ProductDescriptor,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

fn payments_disabled() -> ApiError {
    ErrorResponse::with_status(
        StatusCode::SERVICE_UNAVAILABLE,
        "Payments not configured",
        "PAYMENTS_DISABLED",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe_configured(),
    })
}

/// Create Stripe checkout session
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let checkout = state.checkout.as_ref().ok_or_else(payments_disabled)?;

    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected checkout body");
        ErrorResponse::with_status(StatusCode::BAD_REQUEST, rejection.body_text(), "INVALID_REQUEST")
    })?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let session = checkout
        .create_session(&payload.product, idempotency_key)
        .await
        .map_err(|e| {
            let (status, code) = match &e {
                PaymentError::InvalidProduct(_) => (StatusCode::BAD_REQUEST, "INVALID_PRODUCT"),
                PaymentError::Stripe(_) => (StatusCode::BAD_GATEWAY, "CHECKOUT_ERROR"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "CHECKOUT_ERROR"),
            };
            if status == StatusCode::BAD_REQUEST {
                tracing::info!("Checkout rejected: {}", e);
            } else {
                tracing::error!(retryable = e.is_retryable(), "Checkout error: {}", e);
            }
            let message = match &e {
                PaymentError::InvalidProduct(detail) => detail.clone(),
                other => other.user_message().to_string(),
            };
            ErrorResponse::with_status(status, message, code)
        })?;

    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Stripe webhook handler.
///
/// The body is taken raw: the signature covers the exact bytes Stripe sent.
pub async fn stripe_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(webhooks) = state.webhooks.as_ref() else {
        return payments_disabled().into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let Ok(payload) = std::str::from_utf8(&body) else {
        tracing::warn!("Webhook body is not UTF-8");
        return (StatusCode::BAD_REQUEST, WEBHOOK_ERROR_BODY).into_response();
    };

    let event = match webhooks.construct_event(payload, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Webhook verification failed: {}", e);
            return (StatusCode::BAD_REQUEST, WEBHOOK_ERROR_BODY).into_response();
        }
    };

    match webhooks.handle(event).await {
        Ok(outcome) => {
            if let WebhookOutcome::Fulfilled { event_id, session_id } = &outcome {
                tracing::info!(event_id = %event_id, session_id = %session_id, "Webhook fulfilled");
            }
            Json(WebhookAck { received: true }).into_response()
        }
        Err(e) => {
            tracing::error!("Webhook processing error: {}", e);
            ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Webhook processing failed",
                "WEBHOOK_ERROR",
            )
            .into_response()
        }
    }
}
