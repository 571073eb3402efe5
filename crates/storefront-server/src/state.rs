//! Application State

use std::sync::Arc;

use storefront_core::OrderNotifier;
use storefront_payments::{CheckoutService, WebhookVerifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout and reconciliation service (None if the payment processor
    /// is not configured)
    pub service: Option<Arc<CheckoutService>>,

    /// Confirmation mailer, used directly by the manual order endpoint
    /// (None if SMTP credentials are not configured)
    pub notifier: Option<Arc<dyn OrderNotifier>>,

    /// Webhook signature verifier (None if no webhook secret is configured)
    pub webhook: Option<Arc<WebhookVerifier>>,

    /// Origin used for redirect URLs when the client sends no Origin header
    pub default_origin: String,
}
