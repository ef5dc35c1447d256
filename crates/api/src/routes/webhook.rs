//! Payment gateway webhook.
//!
//! The gateway signs the raw request body with HMAC-SHA256 over the shared
//! secret and sends the hex digest in `x-webhook-signature`. A bad or
//! missing signature is rejected before the body is even parsed. Event
//! processing is best-effort: a valid signature always gets a `200`, and
//! status mutation happens by running the verify-payment operation for the
//! booking behind the event's `tx_ref`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use booking::PaymentGateway;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use store::BookingStore;

use crate::error::ApiError;
use crate::routes::bookings::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 digest of the raw body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

const EVENT_CHARGE_COMPLETED: &str = "charge.completed";
const EVENT_CHARGE_FAILED: &str = "charge.failed";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookChargeData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChargeData {
    pub tx_ref: String,
    pub status: String,
    pub currency: Option<String>,
    pub amount: Option<i64>,
}

/// Computes the hex HMAC-SHA256 digest of `body` under `secret`.
/// Exposed so tests (and local tooling) can sign payloads.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    // Constant-time comparison.
    mac.verify_slice(&expected).is_ok()
}

/// POST /webhooks/payment — signed charge event from the gateway.
#[tracing::instrument(skip(state, headers, body))]
pub async fn receive<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<serde_json::Value>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".to_string()))?;

    if !verify_signature(&state.webhook_secret, &body, signature) {
        metrics::counter!("webhook_signature_failures_total").increment(1);
        return Err(ApiError::BadRequest("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed webhook payload: {e}")))?;

    match event.event.as_str() {
        EVENT_CHARGE_COMPLETED | EVENT_CHARGE_FAILED => {
            process_charge_event(&state, &event).await;
        }
        other => {
            tracing::debug!(event = other, "ignoring webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Resolves the booking behind the event and runs verify-payment.
/// Failures are logged, never surfaced: the gateway retries on its own
/// schedule and the client-facing verify endpoint covers the gap.
async fn process_charge_event<S, P>(state: &AppState<S, P>, event: &WebhookEvent)
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let booking = match state.store.find_booking_by_tx_ref(&event.data.tx_ref).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            tracing::warn!(tx_ref = %event.data.tx_ref, "webhook for unknown transaction reference");
            return;
        }
        Err(e) => {
            tracing::warn!(tx_ref = %event.data.tx_ref, error = %e, "webhook booking lookup failed");
            return;
        }
    };

    match state.coordinator.verify_payment(booking.id).await {
        Ok(updated) => {
            metrics::counter!("webhook_events_processed_total").increment(1);
            tracing::info!(
                booking_id = %booking.id,
                event = %event.event,
                payment_status = %updated.payment_status,
                "webhook processed"
            );
        }
        Err(e) => {
            tracing::warn!(booking_id = %booking.id, error = %e, "webhook verify failed");
        }
    }
}
