//! Support ticket endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::services::SupportError;
use crate::{ApiError, ApiResult, AppState};

/// Support ticket as submitted by the frontend and forwarded upstream
#[derive(Debug, Deserialize, Serialize)]
pub struct SupportRequest {
    pub product: String,
    pub category: String,
    pub message: String,
    pub user_email: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// POST /api/v1/support
pub async fn submit_support(
    State(state): State<AppState>,
    payload: Result<Json<SupportRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload?;
    if !is_valid_email(&payload.user_email) {
        return Err(ApiError::BadRequest(format!(
            "'{}' is not a valid email address",
            payload.user_email
        )));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message cannot be empty".to_string()));
    }

    let ticket = serde_json::to_value(&payload)
        .map_err(|e| ApiError::Internal(format!("Failed to encode ticket: {}", e)))?;

    match state.support.forward(&ticket).await {
        Ok(reply) => {
            info!(product = %payload.product, category = %payload.category, "Support ticket forwarded");
            Ok(Json(reply))
        }
        Err(SupportError::NotConfigured) => Err(ApiError::ServiceUnavailable(
            "Support is not configured".to_string(),
        )),
        Err(SupportError::RateLimited) => Err(ApiError::TooManyRequests(
            "Too many submissions. Try again later.".to_string(),
        )),
        Err(SupportError::Rejected(status, message)) => {
            warn!(status, "Support endpoint rejected ticket");
            Err(ApiError::Upstream { status, message })
        }
        Err(SupportError::NetworkError(e)) => {
            warn!("Support forwarding failed: {}", e);
            Err(ApiError::Upstream {
                status: 502,
                message: "Support service unreachable".to_string(),
            })
        }
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Build support routes
pub fn support_routes() -> Router<AppState> {
    Router::new().route("/support", post(submit_support))
}
