//! SMTP delivery of order confirmation emails.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use storefront_core::{NotifyError, Order, OrderNotifier, format_currency};

use crate::template::{OrderConfirmationHtml, OrderConfirmationText, item_rows, or_unknown};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// SMTP configuration for the confirmation mailer.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub username: String,
    pub password: String,
    /// Inbox that receives order confirmations. Defaults to the sender.
    pub receiver: String,
}

impl MailerConfig {
    /// Read `EMAIL_USER`, `EMAIL_PASS`, `SMTP_HOST` and `EMAIL_RECEIVER`.
    ///
    /// Fails with [`NotifyError::Config`] when credentials are absent, so a
    /// deployment without email still boots and only confirmation refuses
    /// to run.
    pub fn from_env() -> Result<Self, NotifyError> {
        let username = std::env::var("EMAIL_USER")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| NotifyError::Config("EMAIL_USER not set".into()))?;
        let password = std::env::var("EMAIL_PASS")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| NotifyError::Config("EMAIL_PASS not set".into()))?;
        let smtp_host = std::env::var("SMTP_HOST")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let receiver = std::env::var("EMAIL_RECEIVER")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| username.clone());
        Ok(Self {
            smtp_host,
            username,
            password,
            receiver,
        })
    }
}

/// [`OrderNotifier`] delivering order confirmations over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl SmtpMailer {
    pub fn new(config: &MailerConfig) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from: config.username.clone(),
            to: config.receiver.clone(),
        })
    }

    pub fn from_env() -> Result<Self, NotifyError> {
        Self::new(&MailerConfig::from_env()?)
    }
}

#[async_trait]
impl OrderNotifier for SmtpMailer {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        session_id: Option<&str>,
    ) -> Result<(), NotifyError> {
        use askama::Template;

        let total = format_currency(order.total, &order.currency);
        let html = OrderConfirmationHtml {
            session_id,
            customer_name: or_unknown(&order.customer.name),
            customer_email: or_unknown(&order.customer.email),
            customer_address: or_unknown(&order.customer.address),
            rows: item_rows(order),
            total: total.clone(),
        }
        .render()
        .map_err(|e| NotifyError::Template(e.to_string()))?;
        let text = OrderConfirmationText {
            session_id,
            customer_name: or_unknown(&order.customer.name),
            customer_email: or_unknown(&order.customer.email),
            customer_address: or_unknown(&order.customer.address),
            rows: item_rows(order),
            total: total.clone(),
        }
        .render()
        .map_err(|e| NotifyError::Template(e.to_string()))?;

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| NotifyError::Config(format!("invalid sender {}", self.from)))?,
            )
            .to(self
                .to
                .parse()
                .map_err(|_| NotifyError::Config(format!("invalid receiver {}", self.to)))?)
            .subject(format!("New order ({total})"))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| NotifyError::Template(e.to_string()))?;

        // One attempt only. The caller decides whether the order advances.
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        tracing::info!(to = %self.to, total = %total, "order confirmation sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mailer_builds_from_valid_config() {
        let result = SmtpMailer::new(&MailerConfig {
            smtp_host: "smtp.example.com".into(),
            username: "shop@example.com".into(),
            password: "secret".into(),
            receiver: "orders@example.com".into(),
        });
        assert!(result.is_ok());
    }
}
