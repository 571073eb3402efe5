//! Storefront HTTP Server
//!
//! Axum-based server wiring the checkout, reconciliation and notification
//! services behind the storefront's REST endpoints, with the shop frontend
//! served as static files.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::{OrderNotifier, OrderStore};
use storefront_notify::SmtpMailer;
use storefront_payments::{CheckoutConfig, CheckoutService, StripeGateway, WebhookVerifier};

use crate::handlers::{
    confirm_order, create_checkout_session, health_check, manual_order, payment_webhook,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let store = Arc::new(OrderStore::new());

    // Confirmation mailer
    let notifier: Option<Arc<dyn OrderNotifier>> = match SmtpMailer::from_env() {
        Ok(mailer) => {
            tracing::info!("✓ Email configured");
            Some(Arc::new(mailer))
        }
        Err(e) => {
            tracing::warn!("⚠ Email not configured - order confirmations disabled");
            tracing::warn!("  {}", e);
            None
        }
    };

    // Payment gateway
    let service = match StripeGateway::from_env() {
        Ok(gateway) => {
            tracing::info!("✓ Stripe configured");
            Some(Arc::new(CheckoutService::new(
                Arc::new(gateway),
                store,
                notifier.clone(),
                CheckoutConfig::from_env(),
            )))
        }
        Err(_) => {
            tracing::warn!("⚠ Stripe not configured - checkout disabled");
            tracing::warn!("  Set STRIPE_SECRET_KEY in .env");
            None
        }
    };

    // Webhook verification
    let webhook = WebhookVerifier::from_env().ok().map(Arc::new);
    if webhook.is_none() {
        tracing::warn!("⚠ STRIPE_WEBHOOK_SECRET not set - webhooks disabled");
    }

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

    // Build application state
    let state = AppState {
        service,
        notifier,
        webhook,
        default_origin: format!("http://localhost:{port}"),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        // Checkout & orders
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/order/confirm", post(confirm_order))
        .route("/order", post(manual_order))
        // Processor callbacks
        .route("/webhook", post(payment_webhook))
        // Static files (shop frontend)
        .nest_service("/", tower_http::services::ServeDir::new("static"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🛒 storefront server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                   - Health check");
    tracing::info!("  POST /create-checkout-session  - Open hosted checkout");
    tracing::info!("  POST /order/confirm            - Confirm a paid session");
    tracing::info!("  POST /order                    - Email a manual order");
    tracing::info!("  POST /webhook                  - Processor webhooks");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
