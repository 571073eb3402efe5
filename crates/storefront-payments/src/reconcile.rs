//! Order Confirmation and Reconciliation
//!
//! Confirms a checkout session after the customer returns from the hosted
//! payment page: verifies payment, reconciles the locally recorded order
//! against the processor's view (or rebuilds it entirely from processor
//! data), sends the confirmation email exactly once and promotes the order
//! from pending to completed.

use rust_decimal::Decimal;

use storefront_core::{Customer, Order, normalize_session_items};

use crate::checkout::CheckoutService;
use crate::error::{CheckoutError, Result};
use crate::gateway::SessionDetails;

impl CheckoutService {
    /// Confirm a paid checkout session.
    ///
    /// Holds a per-session lock for the whole sequence so concurrent
    /// confirmations of the same session cannot both send the email. The
    /// order is promoted to completed only after the notification succeeds,
    /// so a failed send leaves the order pending and retryable.
    pub async fn confirm_order(&self, session_id: &str) -> Result<Order> {
        if session_id.is_empty() {
            return Err(CheckoutError::InvalidInput("missing session_id".into()));
        }

        let lock = self.store.confirm_lock(session_id);
        let _guard = lock.lock().await;

        let details = self.gateway.retrieve_session(session_id).await?;
        if !details.payment_status.is_paid() {
            tracing::warn!(
                session_id,
                payment_status = ?details.payment_status,
                "confirmation rejected, session not paid"
            );
            return Err(CheckoutError::PaymentIncomplete(session_id.to_string()));
        }

        if let Some(order) = self.store.completed(session_id) {
            tracing::info!(session_id, "order already confirmed");
            return Ok(order);
        }

        let order = match self.store.get_pending(session_id) {
            Some(pending) => overlay_processor_view(pending, &details),
            None => {
                tracing::info!(session_id, "no pending record, rebuilding from processor");
                self.rebuild_order(session_id, &details).await?
            }
        };

        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| CheckoutError::Config("order notifier not configured".into()))?;
        notifier
            .send_order_confirmation(&order, Some(session_id))
            .await?;

        self.store.promote(session_id, order.clone());
        tracing::info!(
            session_id,
            total = %order.total,
            currency = %order.currency,
            "order confirmed"
        );
        Ok(order)
    }

    /// Rebuild the order purely from the processor's session and line items.
    async fn rebuild_order(&self, session_id: &str, details: &SessionDetails) -> Result<Order> {
        let raw_items = self.gateway.list_line_items(session_id).await?;
        let items = normalize_session_items(&raw_items);

        let customer = Customer {
            name: details.customer_name.clone().unwrap_or_default(),
            email: details.customer_email.clone().unwrap_or_default(),
            address: details.customer_address.clone().unwrap_or_default(),
        };

        Ok(Order {
            total: order_total(details, Order::items_total(&items)),
            customer,
            items,
            currency: details
                .currency
                .clone()
                .unwrap_or_default()
                .to_uppercase(),
            created_at: chrono::Utc::now(),
        })
    }
}

/// Reconcile a locally recorded pending order with the processor's view.
///
/// Charged total and currency are taken from the processor. Customer fields
/// captured at checkout win; processor data only fills gaps.
fn overlay_processor_view(mut order: Order, details: &SessionDetails) -> Order {
    order.total = order_total(details, order.total);
    if let Some(currency) = &details.currency {
        order.currency = currency.to_uppercase();
    }
    fill_empty(&mut order.customer.name, details.customer_name.as_deref());
    fill_empty(&mut order.customer.email, details.customer_email.as_deref());
    fill_empty(
        &mut order.customer.address,
        details.customer_address.as_deref(),
    );
    order
}

/// Charged total in major units, falling back to the locally derived sum
/// when the processor omits it.
fn order_total(details: &SessionDetails, fallback: Decimal) -> Decimal {
    details
        .amount_total
        .map_or(fallback, |minor| Decimal::new(minor, 2))
}

fn fill_empty(field: &mut String, candidate: Option<&str>) {
    if field.is_empty()
        && let Some(value) = candidate.filter(|v| !v.is_empty())
    {
        *field = value.to_string();
    }
}
