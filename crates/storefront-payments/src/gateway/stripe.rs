//! Stripe Gateway
//!
//! Implements [`PaymentGateway`] over Stripe's hosted checkout. Session
//! retrieval and line-item listing go through the same retrieve call with a
//! `line_items` expansion. Reported line items are carried through a serde
//! round-trip into [`SessionLineItem`] so the normalizer consumes one stable
//! shape regardless of SDK schema details.

use std::str::FromStr;

use stripe::{
    Address, CheckoutSession as StripeCheckoutSession, CheckoutSessionId, CheckoutSessionMode,
    CheckoutSessionPaymentStatus, Client, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency, StripeError,
};

use async_trait::async_trait;
use storefront_core::SessionLineItem;

use crate::error::{CheckoutError, Result};
use crate::gateway::{
    CreateSessionRequest, CreatedSession, PaymentGateway, PaymentStatus, SessionDetails,
};

/// Stripe client wrapper
pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| CheckoutError::Config("STRIPE_SECRET_KEY not set".into()))?;
        Ok(Self::new(&secret_key))
    }

    async fn retrieve(&self, session_id: &str, expand: &[&str]) -> Result<StripeCheckoutSession> {
        // An id that does not even parse can never name a session.
        let id = CheckoutSessionId::from_str(session_id)
            .map_err(|_| CheckoutError::NotFound(session_id.to_string()))?;

        StripeCheckoutSession::retrieve(&self.client, &id, expand)
            .await
            .map_err(|e| map_stripe_error(&e, session_id))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreatedSession> {
        let currency = currency_from_code(&request.currency);

        let line_items = request
            .items
            .iter()
            .map(|item| CreateCheckoutSessionLineItems {
                quantity: Some(item.quantity),
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency,
                    unit_amount: Some(item.unit_amount),
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: item.name.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.line_items = Some(line_items);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.customer_email = request.customer_email.as_deref();
        if !request.metadata.is_empty() {
            params.metadata = Some(request.metadata.clone());
        }

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| CheckoutError::Upstream(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| CheckoutError::Upstream("no checkout URL returned".into()))?;

        Ok(CreatedSession {
            id: session.id.to_string(),
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails> {
        let session = self.retrieve(session_id, &[]).await?;
        Ok(session_details(&session))
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<SessionLineItem>> {
        let session = self.retrieve(session_id, &["line_items"]).await?;

        let items = session
            .line_items
            .map(|list| {
                list.data
                    .iter()
                    .filter_map(|item| {
                        serde_json::to_value(item)
                            .ok()
                            .and_then(|value| serde_json::from_value(value).ok())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(items)
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Resolve a configured currency code; unknown codes fall back to CAD.
fn currency_from_code(code: &str) -> Currency {
    serde_json::from_value(serde_json::Value::String(code.to_lowercase()))
        .unwrap_or(Currency::CAD)
}

fn map_stripe_error(err: &StripeError, session_id: &str) -> CheckoutError {
    match err {
        StripeError::Stripe(request_err) if request_err.http_status == 404 => {
            CheckoutError::NotFound(session_id.to_string())
        }
        other => CheckoutError::Upstream(other.to_string()),
    }
}

fn session_details(session: &StripeCheckoutSession) -> SessionDetails {
    let metadata = session.metadata.clone().unwrap_or_default();
    let details = session.customer_details.as_ref();

    let customer_name = metadata
        .get("customer_name")
        .cloned()
        .filter(|name| !name.is_empty())
        .or_else(|| details.and_then(|d| d.name.clone()));

    let customer_email = details
        .and_then(|d| d.email.clone())
        .or_else(|| session.customer_email.clone());

    let customer_address = metadata
        .get("customer_address")
        .cloned()
        .filter(|address| !address.is_empty())
        .or_else(|| {
            details
                .and_then(|d| d.address.as_ref())
                .map(format_address)
                .filter(|address| !address.is_empty())
        });

    SessionDetails {
        id: session.id.to_string(),
        payment_status: match session.payment_status {
            CheckoutSessionPaymentStatus::Paid => PaymentStatus::Paid,
            CheckoutSessionPaymentStatus::NoPaymentRequired => PaymentStatus::NoPaymentRequired,
            _ => PaymentStatus::Unpaid,
        },
        amount_total: session.amount_total,
        currency: session.currency.map(|c| c.to_string()),
        customer_name,
        customer_email,
        customer_address,
    }
}

fn format_address(address: &Address) -> String {
    [
        address.line1.as_deref(),
        address.line2.as_deref(),
        address.city.as_deref(),
        address.state.as_deref(),
        address.postal_code.as_deref(),
        address.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}
