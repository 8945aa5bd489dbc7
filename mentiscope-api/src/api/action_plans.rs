//! Action plan status endpoint

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::patch,
    Json, Router,
};
use chrono::{DateTime, Utc};
use mentiscope_common::db::{ActionPlan, ActionStatus};
use serde::Deserialize;
use tracing::info;

use crate::{db, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateActionPlanRequest {
    pub status: ActionStatus,
    /// RFC 3339; left unchanged when absent
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// PATCH /api/v1/action-plans/:id
pub async fn update_action_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateActionPlanRequest>, JsonRejection>,
) -> ApiResult<Json<ActionPlan>> {
    let Json(payload) = payload?;
    let id = super::lookup_id(&id, "Action plan")?;

    let plan = db::action_plans::update_action_plan(&state.db, id, payload.status, payload.due_date)
        .await?
        .ok_or_else(|| ApiError::NotFound("Action plan not found".to_string()))?;

    info!(action_plan_id = %id, status = %plan.status, "Action plan updated");

    Ok(Json(plan))
}

/// Build action plan routes
pub fn action_plan_routes() -> Router<AppState> {
    Router::new().route("/action-plans/:id", patch(update_action_plan))
}
