//! In-process tests for the checkout HTTP endpoints.
//!
//! The router is driven through `tower::ServiceExt::oneshot`; no socket is
//! bound and Stripe is replaced by `MockPaymentProvider`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot

use shop_payments::{
    CompletedCheckout, EventLedger, Fulfiller, LoggingFulfiller, MemoryEventLedger, MockPaymentProvider,
    PaymentsConfig, StripeConfig,
};
use shop_server::{AppState, router};

const WEBHOOK_SECRET: &str = "whsec_test123secret456";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingFulfiller {
    calls: AtomicUsize,
}

#[async_trait]
impl Fulfiller for CountingFulfiller {
    async fn fulfill(&self, _checkout: &CompletedCheckout) -> shop_payments::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingFulfiller;

#[async_trait]
impl Fulfiller for FailingFulfiller {
    async fn fulfill(&self, _checkout: &CompletedCheckout) -> shop_payments::Result<()> {
        Err(shop_payments::PaymentError::Storage("database unavailable".into()))
    }
}

fn config() -> PaymentsConfig {
    PaymentsConfig::new(
        "https://shop.example.com",
        Some(StripeConfig {
            secret_key: "sk_test_xxx".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
        }),
    )
}

struct Harness {
    router: axum::Router,
    provider: Arc<MockPaymentProvider>,
    ledger: Arc<MemoryEventLedger>,
    fulfiller: Arc<CountingFulfiller>,
}

fn harness_with(provider: MockPaymentProvider) -> Harness {
    let provider = Arc::new(provider);
    let ledger = Arc::new(MemoryEventLedger::new());
    let fulfiller = Arc::new(CountingFulfiller::default());
    let state = AppState::new(&config(), provider.clone(), ledger.clone(), fulfiller.clone());

    Harness {
        router: router(state),
        provider,
        ledger,
        fulfiller,
    }
}

fn harness() -> Harness {
    harness_with(MockPaymentProvider::new())
}

async fn call(router: axum::Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: &[u8]) -> serde_json::Value {
    serde_json::from_slice(b).expect("body is not valid JSON")
}

fn checkout_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/checkout")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook_request(payload: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/checkout/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

/// Stripe's scheme computed independently of the crate under test
fn stripe_signature(payload: &str, secret: &str, timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn event_payload(event_id: &str, event_type: &str) -> String {
    serde_json::json!({
        "id": event_id,
        "object": "event",
        "type": event_type,
        "created": now(),
        "livemode": false,
        "data": {
            "object": {
                "id": "cs_test_a1b2c3",
                "object": "checkout.session",
                "amount_total": 4900,
                "currency": "usd",
                "payment_status": "paid",
                "customer_details": { "email": "buyer@example.com" },
                "metadata": { "product_id": "course-101" }
            }
        }
    })
    .to_string()
}

const PRODUCT_BODY: &str =
    r#"{"product":{"title":"Rust Course","amountCents":4900,"currency":"usd","id":"course-101"}}"#;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_stripe_configured() {
    let h = harness();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = call(h.router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(&body);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["stripe_configured"], true);
}

// ---------------------------------------------------------------------------
// POST /api/checkout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_returns_provider_url_unchanged() {
    let h = harness();

    let (status, body) = call(h.router, checkout_request(PRODUCT_BODY)).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(&body);
    assert_eq!(json["url"].as_str(), h.provider.last_url().await.as_deref());

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 1);
    let params = &requests[0];
    assert_eq!(params.line_items.len(), 1);
    assert_eq!(params.line_items[0].quantity, 1);
    assert_eq!(params.line_items[0].unit_amount, 4900);
    assert_eq!(params.line_items[0].currency, "usd");
    assert_eq!(
        params.success_url,
        "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(params.cancel_url, "https://shop.example.com/cancel");
}

#[tokio::test]
async fn checkout_forwards_idempotency_key() {
    let h = harness();
    let mut req = checkout_request(PRODUCT_BODY);
    req.headers_mut()
        .insert("idempotency-key", "order-7f3a".parse().unwrap());

    let (status, _) = call(h.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        h.provider.requests().await[0].idempotency_key.as_deref(),
        Some("order-7f3a")
    );
}

#[tokio::test]
async fn malformed_checkout_json_is_400_and_server_keeps_serving() {
    let h = harness();

    let (status, body) = call(h.router.clone(), checkout_request("{\"product\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(&body)["code"], "INVALID_REQUEST");

    let (status, _) = call(h.router.clone(), checkout_request(r#"{"product":{"title":"x"}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(h.router, checkout_request(PRODUCT_BODY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.provider.requests().await.len(), 1);
}

#[tokio::test]
async fn invalid_product_is_rejected_before_stripe() {
    let h = harness();
    let body = r#"{"product":{"title":"Rust Course","amountCents":-1,"currency":"usd","id":1}}"#;

    let (status, body) = call(h.router, checkout_request(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(&body)["code"], "INVALID_PRODUCT");
    assert!(h.provider.requests().await.is_empty());
}

#[tokio::test]
async fn upstream_failure_is_502_with_error_shape() {
    let h = harness_with(MockPaymentProvider::failing("api_connection_error"));

    let (status, body) = call(h.router, checkout_request(PRODUCT_BODY)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let json = parse_json(&body);
    assert_eq!(json["code"], "CHECKOUT_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("api_connection_error"));
}

#[tokio::test]
async fn payment_routes_are_503_when_disabled() {
    let app = router(AppState::disabled());

    let (status, body) = call(app.clone(), checkout_request(PRODUCT_BODY)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_json(&body)["code"], "PAYMENTS_DISABLED");

    let (status, _) = call(app, webhook_request("{}", Some("t=1,v1=00"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// POST /api/checkout/webhook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_with_wrong_signature_is_400_and_not_processed() {
    let h = harness();
    let payload = event_payload("evt_bad", "checkout.session.completed");
    let signature = stripe_signature(&payload, "whsec_someone_else", now());

    let (status, body) = call(h.router, webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&body[..], b"Webhook error");
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 0);
    assert!(h.ledger.is_empty());
}

#[tokio::test]
async fn webhook_without_signature_is_400() {
    let h = harness();
    let payload = event_payload("evt_nosig", "checkout.session.completed");

    let (status, body) = call(h.router, webhook_request(&payload, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&body[..], b"Webhook error");
}

#[tokio::test]
async fn webhook_tampered_body_is_400() {
    let h = harness();
    let payload = event_payload("evt_t", "checkout.session.completed");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now());
    let tampered = payload.replace("4900", "1");

    let (status, _) = call(h.router, webhook_request(&tampered, Some(&signature))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_replayed_outside_tolerance_is_400() {
    let h = harness();
    let payload = event_payload("evt_old", "checkout.session.completed");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now() - 3600);

    let (status, _) = call(h.router, webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn checkout_completed_is_acknowledged_and_fulfilled_once() {
    let h = harness();
    let payload = event_payload("evt_done", "checkout.session.completed");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now());

    let (status, body) = call(h.router.clone(), webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body), serde_json::json!({ "received": true }));
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 1);
    assert!(h.ledger.get("evt_done").unwrap().is_some());

    // Stripe redelivers the same event
    let (status, body) = call(h.router, webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body), serde_json::json!({ "received": true }));
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn default_fulfiller_records_no_purchase() {
    // Purchase recording and email delivery are not implemented: the event is
    // acknowledged and claimed, and nothing else happens.
    let provider = Arc::new(MockPaymentProvider::new());
    let ledger = Arc::new(MemoryEventLedger::new());
    let state = AppState::new(&config(), provider.clone(), ledger.clone(), Arc::new(LoggingFulfiller));
    let payload = event_payload("evt_gap", "checkout.session.completed");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now());

    let (status, body) = call(router(state), webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body)["received"], true);
    assert_eq!(ledger.len(), 1);
    assert!(provider.requests().await.is_empty());
}

#[tokio::test]
async fn other_event_types_are_acknowledged_without_action() {
    let h = harness();
    let payload = event_payload("evt_other", "payment_intent.succeeded");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now());

    let (status, body) = call(h.router, webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body), serde_json::json!({ "received": true }));
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 0);
    assert!(h.ledger.is_empty());
}

#[tokio::test]
async fn signed_event_without_data_is_acknowledged() {
    let h = harness();
    let payload = r#"{"id":"evt_ping","type":"ping"}"#;
    let signature = stripe_signature(payload, WEBHOOK_SECRET, now());

    let (status, body) = call(h.router, webhook_request(payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body), serde_json::json!({ "received": true }));
    assert_eq!(h.fulfiller.calls.load(Ordering::SeqCst), 0);
    assert!(h.ledger.is_empty());
}

#[tokio::test]
async fn failed_fulfillment_is_500_and_releases_claim() {
    let ledger = Arc::new(MemoryEventLedger::new());
    let state = AppState::new(
        &config(),
        Arc::new(MockPaymentProvider::new()),
        ledger.clone(),
        Arc::new(FailingFulfiller),
    );
    let app = router(state);
    let payload = event_payload("evt_fail", "checkout.session.completed");
    let signature = stripe_signature(&payload, WEBHOOK_SECRET, now());

    let (status, body) = call(app.clone(), webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse_json(&body)["code"], "WEBHOOK_ERROR");
    assert!(ledger.is_empty());

    // Stripe retries; the released claim lets the event be attempted again
    let (status, _) = call(app, webhook_request(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ledger.is_empty());
}
