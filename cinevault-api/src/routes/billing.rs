/// Payment provider webhook
///
/// The provider's hosted checkout is opaque to CineVault; the webhook is the
/// trust boundary. Every delivery is authenticated by an HMAC-SHA256
/// signature over the raw request body, hex-encoded in the
/// `X-Billing-Signature` header, and verified in constant time before the
/// payload is even parsed.
///
/// Deliveries are retried by the provider, so the handler acknowledges
/// duplicates with 200 exactly like first deliveries; the subscription
/// manager's transaction-id dedup makes the repeat a no-op.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use cinevault_shared::models::payment::PaymentNotification;
use cinevault_shared::subscription::PaymentOutcome;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signature header set by the payment provider
pub const SIGNATURE_HEADER: &str = "X-Billing-Signature";

/// Webhook acknowledgment
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,

    /// "activated", "duplicate", or "ignored"
    pub outcome: &'static str,
}

/// Verifies a hex-encoded HMAC-SHA256 signature over the raw body
///
/// Constant-time comparison via the Mac verifier; a malformed hex string
/// simply fails verification.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Computes the hex signature for a body (used by tests and local tooling)
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Payment webhook handler
///
/// # Errors
///
/// - `401` missing or invalid signature
/// - `400` unparseable payload or malformed account id
/// - `500`/`503` store failures; the provider will retry, and the
///   transaction-id dedup keeps that retry safe
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing webhook signature".to_string()))?;

    if !verify_signature(&state.config.billing.webhook_secret, &body, signature) {
        return Err(ApiError::Unauthorized("Invalid webhook signature".to_string()));
    }

    let notification: PaymentNotification = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Unparseable webhook payload: {}", e)))?;

    tracing::info!(
        transaction_id = %notification.transaction_id,
        status = ?notification.status,
        "payment notification received"
    );

    let outcome = state.subscriptions.process_payment(&notification).await?;

    let outcome = match outcome {
        PaymentOutcome::Activated => "activated",
        PaymentOutcome::Duplicate => "duplicate",
        PaymentOutcome::Ignored => "ignored",
    };

    Ok(Json(WebhookResponse {
        success: true,
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_roundtrip() {
        let secret = "webhook-secret";
        let body = br#"{"transaction_id":"txn-1"}"#;

        let signature = sign_body(secret, body);
        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign_body("secret-a", body);
        assert!(!verify_signature("secret-b", body, &signature));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let secret = "webhook-secret";
        let signature = sign_body(secret, b"original");
        assert!(!verify_signature(secret, b"tampered", &signature));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(!verify_signature("secret", b"body", "not hex at all"));
    }
}
