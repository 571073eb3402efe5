//! # storefront-notify
//!
//! Order confirmation email delivery.
//!
//! Implements [`storefront_core::OrderNotifier`] over SMTP with lettre,
//! rendering the confirmation body from Askama templates. A single send
//! attempt is made per call; retry policy belongs to the caller.

mod mailer;
mod template;

pub use mailer::{MailerConfig, SmtpMailer};
pub use template::{ItemRow, OrderConfirmationHtml, OrderConfirmationText};
