//! Order Notification Seam

use async_trait::async_trait;
use thiserror::Error;

use crate::order::Order;

/// Errors surfaced by a notification transport.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport credentials missing or unusable.
    #[error("Notification configuration error: {0}")]
    Config(String),

    /// Rendering the notification body failed.
    #[error("Template error: {0}")]
    Template(String),

    /// The transport refused or failed the send.
    #[error("Send failed: {0}")]
    Send(String),
}

/// Dispatches order-confirmation notifications.
///
/// Implementations perform exactly one send attempt; a failure must surface
/// to the caller, which decides whether the operation is retried. The
/// reconciler depends on that: it promotes an order to completed only after
/// a successful send.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        session_id: Option<&str>,
    ) -> Result<(), NotifyError>;
}
