//! # storefront-payments
//!
//! Hosted-checkout payments for the storefront.
//!
//! **Flow:** Your site → Redirect to the processor's hosted page → Redirect back
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌──────────────┐
//! │  Storefront │────▶│  Hosted Payment │────▶│  Storefront  │
//! │   (cart)    │     │      Page       │     │  (/confirm)  │
//! └─────────────┘     └─────────────────┘     └──────────────┘
//! ```
//!
//! The cart is priced and sent to the processor as a new checkout session,
//! and the order is recorded as pending under the session id. When the
//! customer returns, [`CheckoutService::confirm_order`] verifies payment
//! with the processor, reconciles the order, emails the confirmation and
//! promotes the order to completed. Confirmation is idempotent and safe
//! under concurrent calls.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::{CheckoutConfig, CheckoutService, StripeGateway};
//!
//! let gateway = Arc::new(StripeGateway::from_env()?);
//! let service = CheckoutService::new(gateway, store, Some(mailer), CheckoutConfig::from_env());
//!
//! let session = service.create_checkout_session(cart, origin).await?;
//! // Redirect the customer to: session.url
//! ```

mod checkout;
mod error;
mod gateway;
mod reconcile;
mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

pub use checkout::{CartPayload, CheckoutConfig, CheckoutService, SESSION_ID_PLACEHOLDER};
pub use error::{CheckoutError, Result};
pub use gateway::{
    CreateSessionRequest, CreatedSession, PaymentGateway, PaymentStatus, PricedItem,
    SessionDetails,
};
pub use gateway::stripe::StripeGateway;
pub use webhook::{WebhookEvent, WebhookVerifier};
