//! Scripted gateway and notifier for service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use storefront_core::{NotifyError, Order, OrderNotifier, SessionLineItem};

use crate::checkout::CartPayload;
use crate::error::{CheckoutError, Result};
use crate::gateway::{
    CreateSessionRequest, CreatedSession, PaymentGateway, SessionDetails,
};

/// Deserialize a JSON cart fixture.
pub fn cart_payload(value: serde_json::Value) -> CartPayload {
    serde_json::from_value(value).unwrap()
}

/// Gateway returning scripted responses and recording creation requests.
#[derive(Default)]
pub struct MockGateway {
    session: Mutex<Option<SessionDetails>>,
    line_items: Mutex<Vec<SessionLineItem>>,
    create_requests: Mutex<Vec<CreateSessionRequest>>,
    fail_create: Mutex<Option<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the session the gateway reports on retrieval.
    pub fn set_session(&self, details: SessionDetails) {
        *self.session.lock().unwrap() = Some(details);
    }

    /// Script the line items the gateway reports for the session.
    pub fn set_line_items(&self, items: Vec<SessionLineItem>) {
        *self.line_items.lock().unwrap() = items;
    }

    /// Make the next `create_session` fail upstream.
    pub fn fail_create(&self, message: &str) {
        *self.fail_create.lock().unwrap() = Some(message.to_string());
    }

    pub fn last_create_request(&self) -> Option<CreateSessionRequest> {
        self.create_requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreatedSession> {
        if let Some(message) = self.fail_create.lock().unwrap().take() {
            return Err(CheckoutError::Upstream(message));
        }
        self.create_requests.lock().unwrap().push(request);
        Ok(CreatedSession {
            id: "cs_test_a1b2c3".to_string(),
            url: "https://checkout.test/pay/cs_test_a1b2c3".to_string(),
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails> {
        self.session
            .lock()
            .unwrap()
            .clone()
            .filter(|details| details.id == session_id)
            .ok_or_else(|| CheckoutError::NotFound(session_id.to_string()))
    }

    async fn list_line_items(&self, _session_id: &str) -> Result<Vec<SessionLineItem>> {
        Ok(self.line_items.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Notifier counting sends, optionally failing the next one.
#[derive(Default)]
pub struct MockNotifier {
    sent: AtomicUsize,
    fail_next: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderNotifier for MockNotifier {
    async fn send_order_confirmation(
        &self,
        _order: &Order,
        _session_id: Option<&str>,
    ) -> std::result::Result<(), NotifyError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NotifyError::Send("smtp unavailable".to_string()));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
