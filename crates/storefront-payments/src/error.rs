//! Checkout Error Types

use storefront_core::NotifyError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Errors raised by session creation, confirmation and webhook handling
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Malformed or empty client input (cart, session id)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The processor has no session for this id
    #[error("Checkout session not found: {0}")]
    NotFound(String),

    /// Session exists but its payment has not completed yet
    #[error("Payment not completed for session: {0}")]
    PaymentIncomplete(String),

    /// Processor API failure; never retried automatically
    #[error("Payment gateway error: {0}")]
    Upstream(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Missing credentials or secrets
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification dispatch failed; the order stays pending so a retried
    /// confirmation can attempt the send again
    #[error("Notification failed: {0}")]
    Notification(#[from] NotifyError),
}

impl CheckoutError {
    /// Whether a later identical call could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::PaymentIncomplete(_)
                | CheckoutError::Upstream(_)
                | CheckoutError::Notification(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            CheckoutError::InvalidInput(_) => "Your cart could not be processed.",
            CheckoutError::NotFound(_) => "Checkout session not found.",
            CheckoutError::PaymentIncomplete(_) => "Payment has not completed yet.",
            CheckoutError::Upstream(_) => "Payment processing failed. Please try again.",
            CheckoutError::WebhookSignature(_) => "Webhook could not be verified.",
            CheckoutError::Config(_) => "Service configuration error.",
            CheckoutError::Notification(_) => "Order confirmation could not be sent.",
        }
    }
}
