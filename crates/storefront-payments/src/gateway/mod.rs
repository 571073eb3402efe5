//! Payment Gateway Abstraction
//!
//! The processor is reached through this trait so the checkout and
//! reconciliation services can be exercised against a scripted gateway in
//! tests. The only production implementation is [`crate::StripeGateway`].

pub mod stripe;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use storefront_core::SessionLineItem;

use crate::error::Result;

/// One line of a session-creation request, already priced in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub name: String,
    /// Unit amount in minor currency units (cents).
    pub unit_amount: i64,
    pub quantity: u64,
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub items: Vec<PricedItem>,
    /// Lowercase ISO currency code.
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    /// Customer fields forwarded so the processor's record alone can
    /// reconstruct the order if local state is lost.
    pub metadata: HashMap<String, String>,
}

/// A session the processor agreed to host.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub id: String,
    /// Hosted payment page to redirect the client to.
    pub url: String,
}

/// Payment state the processor reports for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl PaymentStatus {
    #[must_use]
    pub fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// Authoritative session state retrieved from the processor, with customer
/// fields already resolved from customer details and the metadata bag.
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub id: String,
    pub payment_status: PaymentStatus,
    /// Total charged, in minor currency units.
    pub amount_total: Option<i64>,
    /// Lowercase ISO currency code.
    pub currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
}

/// Processor client surface used by the checkout and reconciliation services.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session.
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreatedSession>;

    /// Retrieve authoritative session status.
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails>;

    /// List the line items the processor recorded for a session.
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<SessionLineItem>>;

    /// Gateway name, for logging.
    fn name(&self) -> &str;
}
