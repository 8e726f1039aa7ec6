//! Storefront HTTP Server
//!
//! Serves the checkout API and the Leptos frontend.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_payments::PaymentsConfig;
use shop_server::{AppState, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PaymentsConfig::from_env()?;
    let state = AppState::from_config(&config);

    if state.stripe_configured() {
        tracing::info!(app_url = %config.app_url, "✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - payments disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let app = app(state, &static_dir);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 shop-server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  POST /api/checkout          - Create Stripe checkout session");
    tracing::info!("  POST /api/checkout/webhook  - Stripe webhook receiver");
    tracing::info!("  GET  /*                     - Frontend from {}", static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}
