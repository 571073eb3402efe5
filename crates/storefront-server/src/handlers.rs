//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::ORIGIN},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use storefront_core::{
    CartItem, Customer, Order, normalize_cart, to_number,
};
use storefront_payments::{CartPayload, CheckoutError, CreatedSession, WebhookEvent};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub mailer_configured: bool,
}

/// Error body for the checkout endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body for the order endpoints.
#[derive(Debug, Serialize)]
pub struct OrderErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub session_id: String,
}

/// Manually submitted order, emailed without going through the processor.
#[derive(Debug, Deserialize)]
pub struct ManualOrderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    /// Cart items, either as an array or as a JSON-encoded string.
    pub cart: Option<serde_json::Value>,
    pub total: Option<serde_json::Value>,
    #[serde(default)]
    pub currency: String,
}

type CheckoutRejection = (StatusCode, Json<ErrorResponse>);
type OrderRejection = (StatusCode, Json<OrderErrorResponse>);

fn error_status(err: &CheckoutError) -> StatusCode {
    match err {
        CheckoutError::InvalidInput(_) | CheckoutError::PaymentIncomplete(_) => {
            StatusCode::BAD_REQUEST
        }
        CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::Upstream(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        CheckoutError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CheckoutError::WebhookSignature(_) => StatusCode::BAD_REQUEST,
    }
}

fn checkout_rejection(err: &CheckoutError) -> CheckoutRejection {
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.user_message().to_string(),
        }),
    )
}

fn order_rejection(err: &CheckoutError) -> OrderRejection {
    (
        error_status(err),
        Json(OrderErrorResponse {
            success: false,
            error: err.user_message().to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.service.is_some(),
        mailer_configured: state.notifier.is_some(),
    })
}

/// Open a hosted checkout session for the submitted cart
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CartPayload>,
) -> Result<Json<CreatedSession>, CheckoutRejection> {
    let service = state.service.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Payments not configured".into(),
            }),
        )
    })?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(&state.default_origin);

    let session = service
        .create_checkout_session(payload, origin)
        .await
        .map_err(|e| {
            tracing::warn!("checkout session rejected: {}", e);
            checkout_rejection(&e)
        })?;

    Ok(Json(session))
}

/// Confirm a paid session: reconcile, email, promote
pub async fn confirm_order(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, OrderRejection> {
    let service = state.service.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(OrderErrorResponse {
                success: false,
                error: "Payments not configured".into(),
            }),
        )
    })?;

    let order = service
        .confirm_order(&payload.session_id)
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %payload.session_id, "confirmation failed: {}", e);
            order_rejection(&e)
        })?;

    Ok(Json(ConfirmResponse {
        success: true,
        order,
    }))
}

/// Processor webhook endpoint. Signature is verified; completed-checkout
/// events are logged but do not drive confirmation.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, CheckoutRejection> {
    let verifier = state.webhook.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Webhooks not configured".into(),
            }),
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Missing signature".into(),
                }),
            )
        })?;

    let event = verifier.parse(&body, signature).map_err(|e| {
        tracing::warn!("webhook rejected: {}", e);
        checkout_rejection(&e)
    })?;

    match event {
        WebhookEvent::CheckoutCompleted { session_id } => {
            tracing::info!(%session_id, "payment completed, awaiting client confirmation");
        }
        WebhookEvent::Other { event_type } => {
            tracing::debug!(%event_type, "ignoring webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

/// Email a manually submitted order without touching the processor
pub async fn manual_order(
    State(state): State<AppState>,
    Json(payload): Json<ManualOrderRequest>,
) -> Result<Json<serde_json::Value>, OrderRejection> {
    let missing = payload.name.is_empty()
        || payload.email.is_empty()
        || payload.cart.is_none()
        || payload.total.is_none();
    if missing {
        return Err(order_rejection(&CheckoutError::InvalidInput(
            "name, email, cart and total are required".into(),
        )));
    }

    let cart_items = parse_cart(payload.cart.as_ref().unwrap_or(&serde_json::Value::Null))
        .ok_or_else(|| {
            order_rejection(&CheckoutError::InvalidInput("cart is not a list".into()))
        })?;
    let items = normalize_cart(&cart_items);
    if items.is_empty() {
        return Err(order_rejection(&CheckoutError::InvalidInput(
            "no purchasable items in cart".into(),
        )));
    }

    let notifier = state.notifier.as_ref().ok_or_else(|| {
        order_rejection(&CheckoutError::Config("Email not configured".into()))
    })?;

    let order = Order {
        customer: Customer {
            name: payload.name,
            email: payload.email,
            address: payload.address,
        },
        total: to_number(payload.total.as_ref().unwrap_or(&serde_json::Value::Null)),
        items,
        currency: if payload.currency.is_empty() {
            "CAD".into()
        } else {
            payload.currency.to_uppercase()
        },
        created_at: Utc::now(),
    };

    notifier
        .send_order_confirmation(&order, None)
        .await
        .map_err(|e| {
            tracing::error!("manual order email failed: {}", e);
            order_rejection(&CheckoutError::Notification(e))
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Accept a cart encoded either as a JSON array or as a JSON string
/// containing one.
fn parse_cart(value: &serde_json::Value) -> Option<Vec<CartItem>> {
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        serde_json::Value::String(raw) => serde_json::from_str(raw).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_accepts_array_and_string() {
        let array = serde_json::json!([{"name": "Varenyky", "price": "12.5"}]);
        let items = parse_cart(&array).unwrap();
        assert_eq!(items.len(), 1);

        let encoded =
            serde_json::Value::String(r#"[{"name": "Kvas", "price": 3, "qty": 2}]"#.to_string());
        let items = parse_cart(&encoded).unwrap();
        assert_eq!(items.len(), 1);

        assert!(parse_cart(&serde_json::json!(42)).is_none());
        assert!(parse_cart(&serde_json::Value::String("not json".into())).is_none());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&CheckoutError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&CheckoutError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&CheckoutError::PaymentIncomplete("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&CheckoutError::Upstream("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&CheckoutError::Config("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
