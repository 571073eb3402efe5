//! Checkout Session Orchestration
//!
//! Validates a submitted cart, opens a hosted payment session and records
//! the pending order keyed by the session id. Reconciliation of the session
//! after payment lives in [`crate::reconcile`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use storefront_core::{
    CartItem, Customer, Order, OrderNotifier, OrderStore, normalize_cart, truncate_chars,
};

use crate::error::{CheckoutError, Result};
use crate::gateway::{CreateSessionRequest, CreatedSession, PaymentGateway, PricedItem};

/// Token the processor substitutes with the session id on redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Metadata value bound imposed by the processor.
const METADATA_MAX_CHARS: usize = 500;

/// Checkout configuration, environment-sourced.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Lowercase ISO currency code used for new sessions.
    pub currency: String,
    /// Explicit post-payment redirect; derived from the request origin when unset.
    pub success_url: Option<String>,
    /// Explicit cancellation redirect; derived from the request origin when unset.
    pub cancel_url: Option<String>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "cad".into(),
            success_url: None,
            cancel_url: None,
        }
    }
}

impl CheckoutConfig {
    /// Read `STRIPE_CURRENCY`, `SUCCESS_URL` and `CANCEL_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |var: &str| std::env::var(var).ok().filter(|v| !v.is_empty());
        Self {
            currency: non_empty("STRIPE_CURRENCY")
                .map_or_else(|| "cad".into(), |c| c.to_lowercase()),
            success_url: non_empty("SUCCESS_URL"),
            cancel_url: non_empty("CANCEL_URL"),
        }
    }
}

/// Client-submitted checkout payload. `items` is kept as a raw value so a
/// body where it is not a sequence gets the same invalid-input rejection
/// as a missing or empty cart instead of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub items: Option<serde_json::Value>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

/// Orchestrates session creation and order confirmation against one
/// [`PaymentGateway`], one [`OrderStore`] and (when configured) one
/// [`OrderNotifier`].
#[derive(Clone)]
pub struct CheckoutService {
    pub(crate) gateway: Arc<dyn PaymentGateway>,
    pub(crate) store: Arc<OrderStore>,
    pub(crate) notifier: Option<Arc<dyn OrderNotifier>>,
    pub(crate) config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<OrderStore>,
        notifier: Option<Arc<dyn OrderNotifier>>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            config,
        }
    }

    /// Validate the cart, open a hosted payment session and record the
    /// pending order under the session id.
    ///
    /// `origin` is the client's declared origin, used to derive redirect
    /// URLs when none are configured.
    pub async fn create_checkout_session(
        &self,
        cart: CartPayload,
        origin: &str,
    ) -> Result<CreatedSession> {
        let raw_items: Vec<CartItem> = match cart.items {
            Some(value) => serde_json::from_value(value)
                .map_err(|_| CheckoutError::InvalidInput("items is not a list".into()))?,
            None => Vec::new(),
        };
        if raw_items.is_empty() {
            return Err(CheckoutError::InvalidInput("no items provided".into()));
        }

        let customer = cart.customer.unwrap_or_default();

        // Price and keep items in lockstep so the recorded order holds
        // exactly what was sent to the processor.
        let normalized = normalize_cart(&raw_items);
        let mut priced = Vec::with_capacity(normalized.len());
        let mut items = Vec::with_capacity(normalized.len());
        for item in normalized {
            let Some(unit_amount) = minor_units(item.price) else {
                tracing::warn!(name = %item.name, "discarding item with unrepresentable price");
                continue;
            };
            priced.push(PricedItem {
                name: item.name.clone(),
                unit_amount,
                quantity: item.quantity,
            });
            items.push(item);
        }
        if items.is_empty() {
            return Err(CheckoutError::InvalidInput(
                "no purchasable items in cart".into(),
            ));
        }

        let success_url = self
            .config
            .success_url
            .clone()
            .unwrap_or_else(|| format!("{origin}/success.html"));
        let cancel_url = self
            .config
            .cancel_url
            .clone()
            .unwrap_or_else(|| format!("{origin}/cancel.html"));

        let request = CreateSessionRequest {
            items: priced,
            currency: self.config.currency.clone(),
            success_url: with_session_placeholder(&success_url),
            cancel_url,
            customer_email: Some(customer.email.clone()).filter(|email| email.contains('@')),
            metadata: customer_metadata(&customer),
        };

        let session = self.gateway.create_session(request).await?;

        let order = Order {
            total: Order::items_total(&items),
            customer,
            items,
            currency: self.config.currency.to_uppercase(),
            created_at: Utc::now(),
        };
        self.store.put_pending(&session.id, order);

        tracing::info!(
            session_id = %session.id,
            gateway = self.gateway.name(),
            "checkout session created"
        );
        Ok(session)
    }
}

/// Convert a major-unit price to minor units, rounding half away from zero.
/// `None` when the price cannot be represented as a positive minor-unit
/// amount; such items are not billable.
fn minor_units(price: Decimal) -> Option<i64> {
    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|minor| *minor > 0)
}

/// Customer fields forwarded to the processor so a later cold
/// reconstruction has them even if the local store is gone.
fn customer_metadata(customer: &Customer) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    if !customer.name.is_empty() {
        metadata.insert(
            "customer_name".to_string(),
            truncate_chars(&customer.name, METADATA_MAX_CHARS),
        );
    }
    if !customer.address.is_empty() {
        metadata.insert(
            "customer_address".to_string(),
            truncate_chars(&customer.address, METADATA_MAX_CHARS),
        );
    }
    metadata
}

/// Ensure the success URL carries the session-id placeholder, appending it
/// as a query parameter when the configured URL lacks one.
fn with_session_placeholder(url: &str) -> String {
    if url.contains(SESSION_ID_PLACEHOLDER) {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&session_id={SESSION_ID_PLACEHOLDER}")
    } else {
        format!("{url}?session_id={SESSION_ID_PLACEHOLDER}")
    }
}
