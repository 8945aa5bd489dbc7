//! Assessment submission endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use mentiscope_common::db::AssessmentType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::{analyze_assessment, AnalysisOutcome};
use crate::{db, ApiError, ApiResult, AppState};

/// Request payload for a new assessment
#[derive(Debug, Deserialize)]
pub struct SubmitAssessmentRequest {
    pub student_id: String,
    pub assessment_type: AssessmentType,
    /// Free-form questionnaire answers; must be a JSON object
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct SubmitAssessmentResponse {
    pub status: &'static str,
    pub assessment_id: Uuid,
}

/// POST /api/v1/assessments/submit
///
/// Stores the assessment, then runs analysis inline. Analysis failures are
/// logged and do not fail the submission.
pub async fn submit_assessment(
    State(state): State<AppState>,
    payload: Result<Json<SubmitAssessmentRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitAssessmentResponse>> {
    let Json(payload) = payload?;
    if !payload.data.is_object() {
        return Err(ApiError::BadRequest("data must be a JSON object".to_string()));
    }

    let student_id = super::lookup_id(&payload.student_id, "Student")?;
    if db::students::get_student(&state.db, student_id).await?.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let assessment = db::assessments::insert_assessment(
        &state.db,
        student_id,
        payload.assessment_type,
        payload.data,
    )
    .await?;

    info!(
        assessment_id = %assessment.id,
        %student_id,
        kind = %assessment.assessment_type,
        "Assessment stored"
    );

    run_analysis(&state, assessment.id).await;

    Ok(Json(SubmitAssessmentResponse {
        status: "success",
        assessment_id: assessment.id,
    }))
}

/// Run the dispatcher, logging and recording any failure
pub(crate) async fn run_analysis(state: &AppState, assessment_id: Uuid) -> Option<AnalysisOutcome> {
    match analyze_assessment(&state.db, state.analysis_provider(), assessment_id).await {
        Ok(outcome) => {
            if matches!(outcome, AnalysisOutcome::Completed(_)) {
                state.clear_error().await;
            }
            Some(outcome)
        }
        Err(e) => {
            error!(%assessment_id, "Analysis failed: {}", e);
            state
                .record_error(format!("Analysis of {} failed: {}", assessment_id, e))
                .await;
            None
        }
    }
}

/// Build assessment routes
pub fn assessment_routes() -> Router<AppState> {
    Router::new().route("/assessments/submit", post(submit_assessment))
}
