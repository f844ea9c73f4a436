use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::schemas::PaymentWebhookPayload;
use crate::services::bookings::PaymentNotice;
use crate::services::webhook_auth::verify_webhook_signature;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/webhooks/payments", axum::routing::post(payment_webhook))
}

/// Payment provider webhook. The endpoint is public, so the payload is
/// trusted only after the HMAC signature over the raw body verifies.
/// Redeliveries are success: the state machine detects the current status
/// and does not double-transition.
async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let secret = state
        .config
        .payment_webhook_secret
        .as_deref()
        .ok_or_else(|| {
            AppError::Dependency("PAYMENT_WEBHOOK_SECRET is not configured.".to_string())
        })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("Missing webhook signature header.".to_string())
        })?;

    if !verify_webhook_signature(&body, signature, secret) {
        return Err(AppError::Unauthorized(
            "Invalid webhook signature.".to_string(),
        ));
    }

    let payload: PaymentWebhookPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {e}")))?;

    // Only successful charges move the state machine; everything else is
    // acknowledged and dropped so the provider stops retrying.
    if !matches!(payload.payment_status.as_str(), "completed" | "approved") {
        tracing::debug!(
            booking_id = %payload.booking_id,
            payment_status = %payload.payment_status,
            "Ignoring non-success payment webhook"
        );
        return Ok(Json(json!({ "received": true })));
    }

    let bookings = state.bookings()?;
    let booking = bookings
        .confirm_payment(PaymentNotice {
            booking_id: payload.booking_id,
            order_id: payload.order_id,
            transaction_id: payload.transaction_id,
        })
        .await?;

    Ok(Json(json!({
        "received": true,
        "booking_id": booking.id,
        "status": booking.status,
    })))
}
