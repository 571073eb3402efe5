//! # storefront-core
//!
//! Domain types and pure logic for the storefront: money coercion and
//! formatting, line-item normalization, the order model, the process-lifetime
//! order store, and the notification seam.
//!
//! Everything here is I/O-free. The payment-processor integration lives in
//! `storefront-payments`; the email transport lives in `storefront-notify`.

pub mod line_item;
pub mod money;
pub mod notify;
pub mod order;
pub mod store;

pub use line_item::{CartItem, LineItem, SessionLineItem, SessionPrice, normalize_cart,
    normalize_session_items, truncate_chars};
pub use money::{format_currency, to_number};
pub use notify::{NotifyError, OrderNotifier};
pub use order::{Customer, Order};
pub use store::OrderStore;
