/// Subscription endpoints
///
/// All endpoints operate on the authenticated account from the bearer
/// context; nobody can subscribe, cancel, or read history for someone else.
///
/// # Endpoints
///
/// - `POST /v1/subscriptions`: purchase a plan
/// - `POST /v1/subscriptions/cancel`: cancel the current subscription
/// - `GET  /v1/subscriptions`: ledger history, newest first

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use cinevault_shared::auth::middleware::AuthContext;
use cinevault_shared::models::profile::PlanType;
use cinevault_shared::models::subscription::SubscriptionRecord;
use serde::{Deserialize, Serialize};

/// Subscription purchase request
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_type: PlanType,

    /// Optional payment method label recorded in the ledger
    pub payment_method: Option<String>,
}

/// Plain success acknowledgment
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Subscription history response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub records: Vec<SubscriptionRecord>,
}

/// Purchase a subscription for the authenticated account
///
/// Direct purchases share the idempotent activation path with the payment
/// webhook; a double-clicked submit serializes on the per-account lock.
///
/// # Errors
///
/// - `404` no profile for the account
/// - `500` ledger write failed (the subscription itself is active)
/// - `503` store unavailable
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<Json<AckResponse>> {
    state
        .subscriptions
        .create_subscription(
            &auth.account_id.to_string(),
            req.plan_type,
            req.payment_method,
        )
        .await?;

    Ok(Json(AckResponse { success: true }))
}

/// Cancel the authenticated account's subscription
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AckResponse>> {
    state.subscriptions.cancel_subscription(auth.account_id).await?;
    Ok(Json(AckResponse { success: true }))
}

/// Ledger history for the authenticated account
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<HistoryResponse>> {
    let records = state.subscriptions.history(auth.account_id).await?;
    Ok(Json(HistoryResponse {
        success: true,
        records,
    }))
}
