//! Payment Processor Webhooks
//!
//! Verifies webhook signatures and classifies the events the storefront
//! cares about. Completed-checkout events are observational; order
//! confirmation is driven by the client redirect.

use stripe::{EventObject, EventType, Webhook};

use crate::error::{CheckoutError, Result};

/// Parsed webhook event.
#[derive(Clone, Debug)]
pub enum WebhookEvent {
    /// The customer finished the hosted payment page.
    CheckoutCompleted { session_id: String },
    /// Any event type the storefront does not act on.
    Other { event_type: String },
}

/// Verifies and parses processor webhook payloads.
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create from the `STRIPE_WEBHOOK_SECRET` environment variable.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| CheckoutError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;
        Ok(Self::new(secret))
    }

    /// Verify the signature header and classify the event.
    pub fn parse(&self, payload: &str, signature: &str) -> Result<WebhookEvent> {
        let event = Webhook::construct_event(payload, signature, &self.secret)
            .map_err(|e| CheckoutError::WebhookSignature(e.to_string()))?;

        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    tracing::info!(session_id = %session.id, "checkout session completed");
                    Ok(WebhookEvent::CheckoutCompleted {
                        session_id: session.id.to_string(),
                    })
                } else {
                    Err(CheckoutError::WebhookSignature(
                        "unexpected object for checkout.session.completed".into(),
                    ))
                }
            }
            other => Ok(WebhookEvent::Other {
                event_type: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage_signature() {
        let verifier = WebhookVerifier::new("whsec_test");
        let err = verifier
            .parse(r#"{"id":"evt_1","object":"event"}"#, "not-a-signature")
            .unwrap_err();
        assert!(matches!(err, CheckoutError::WebhookSignature(_)));
    }

    #[test]
    fn test_rejects_forged_signature() {
        let verifier = WebhookVerifier::new("whsec_test");
        let err = verifier
            .parse(
                r#"{"id":"evt_1","object":"event"}"#,
                "t=1712000000,v1=deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::WebhookSignature(_)));
    }

    #[test]
    fn test_rejects_empty_payload() {
        let verifier = WebhookVerifier::new("whsec_test");
        assert!(verifier.parse("", "").is_err());
    }
}
