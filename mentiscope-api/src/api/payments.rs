//! Checkout and payment webhook endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use mentiscope_common::api::{verify_signature, SignatureError};
use mentiscope_common::db::SubscriptionStatus;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{db, ApiError, ApiResult, AppState};

/// Header carrying the webhook body signature
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// POST /api/v1/payments/create-checkout?user_id=
///
/// Issues a checkout link without contacting the payment provider.
pub async fn create_checkout(
    State(state): State<AppState>,
    query: Result<Query<CheckoutQuery>, QueryRejection>,
) -> ApiResult<Json<CheckoutResponse>> {
    let Query(query) = query?;
    let user = db::users::get_user(&state.db, query.user_id.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let token = format!("mock_{}", Uuid::new_v4().simple());
    let checkout_url = format!(
        "{}/{}",
        state.settings.payments.checkout_base_url.trim_end_matches('/'),
        token
    );

    info!(user_id = %user.id, "Checkout session issued");

    Ok(Json(CheckoutResponse { checkout_url }))
}

/// Subscription change carried by a webhook event
fn subscription_change(event_type: &str) -> Option<SubscriptionStatus> {
    match event_type {
        "subscription.created" | "subscription.active" => Some(SubscriptionStatus::Active),
        "subscription.cancelled" | "subscription.canceled" => Some(SubscriptionStatus::Canceled),
        _ => None,
    }
}

/// POST /api/v1/payments/webhook
///
/// Verifies the body signature when a webhook secret is configured, then
/// applies subscription events. Unknown events and customers are acknowledged.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    event: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(event) = event?;
    if let Some(secret) = state.settings.payments.webhook_secret.as_deref() {
        let provided = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        match verify_signature(provided, &event, secret) {
            Ok(()) => {}
            Err(SignatureError::Missing) => {
                warn!("Webhook rejected: missing signature");
                return Err(ApiError::BadRequest("Missing webhook signature".to_string()));
            }
            Err(SignatureError::Mismatch { provided, calculated }) => {
                warn!("Webhook rejected: signature mismatch");
                debug!(%provided, %calculated, "Signature mismatch details");
                return Err(ApiError::Unauthorized("Invalid webhook signature".to_string()));
            }
        }
    }

    let event_type = event.get("type").and_then(Value::as_str).unwrap_or_default();

    let Some(status) = subscription_change(event_type) else {
        debug!(event_type, "Ignoring webhook event");
        return Ok(Json(json!({"status": "success"})));
    };

    let email = event
        .pointer("/data/customer/email")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty());

    match email {
        Some(email) => {
            if db::users::set_subscription_by_email(&state.db, email, status).await? {
                info!(event_type, %status, "Subscription updated");
            } else {
                info!(event_type, "Webhook for unknown customer acknowledged");
            }
        }
        None => warn!(event_type, "Subscription event without customer email"),
    }

    Ok(Json(json!({"status": "success"})))
}

/// Build payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/create-checkout", post(create_checkout))
        .route("/payments/webhook", post(payment_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_change() {
        assert_eq!(subscription_change("subscription.created"), Some(SubscriptionStatus::Active));
        assert_eq!(subscription_change("subscription.active"), Some(SubscriptionStatus::Active));
        assert_eq!(subscription_change("subscription.cancelled"), Some(SubscriptionStatus::Canceled));
        assert_eq!(subscription_change("subscription.canceled"), Some(SubscriptionStatus::Canceled));
        assert_eq!(subscription_change("payment.succeeded"), None);
        assert_eq!(subscription_change(""), None);
    }
}
