//! Student CRUD, dashboard and re-analysis endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use mentiscope_common::db::{ActionPlan, Assessment, Insight, Student, User};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::assessments::run_analysis;
use crate::{db, ApiError, ApiResult, AppState};

const NO_ASSESSMENT_MESSAGE: &str =
    "No neural mappings found. Please complete an initial check-in.";

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub grade_level: String,
    pub parent_id: String,
    #[serde(default)]
    pub school_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    pub parent_id: String,
}

/// Student with everything the dashboard renders
#[derive(Debug, Serialize)]
pub struct StudentDashboard {
    #[serde(flatten)]
    pub student: Student,
    pub parent: Option<User>,
    pub assessments: Vec<Assessment>,
    pub insights: Vec<Insight>,
    pub action_plans: Vec<ActionPlan>,
}

/// POST /api/v1/students
///
/// `parent_id` is the identity provider's opaque id for the parent.
/// Creates a placeholder parent account when `parent_id` is unknown.
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<CreateStudentRequest>, JsonRejection>,
) -> ApiResult<Json<Student>> {
    let Json(payload) = payload?;
    let name = required(&payload.name, "name")?;
    let grade_level = required(&payload.grade_level, "grade_level")?;
    let parent_id = required(&payload.parent_id, "parent_id")?;

    let parent = db::users::ensure_parent(&state.db, parent_id).await?;

    let student = db::students::insert_student(
        &state.db,
        &parent.id,
        name,
        grade_level,
        payload.school_type.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    )
    .await?;

    info!(student_id = %student.id, parent_id, "Student created");

    Ok(Json(student))
}

/// GET /api/v1/students?parent_id=
pub async fn list_students(
    State(state): State<AppState>,
    query: Result<Query<ListStudentsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Student>>> {
    let Query(query) = query?;
    let parent_id = query.parent_id.trim();
    Ok(Json(db::students::list_for_parent(&state.db, parent_id).await?))
}

/// GET /api/v1/students/:student_id
pub async fn get_student_dashboard(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<StudentDashboard>> {
    let student_id = super::lookup_id(&student_id, "Student")?;
    let student = db::students::get_student(&state.db, student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let parent = db::users::get_user(&state.db, &student.parent_id).await?;
    let assessments = db::assessments::list_for_student(&state.db, student_id).await?;
    let insights = db::insights::list_for_student(&state.db, student_id).await?;
    let action_plans = db::action_plans::list_for_student(&state.db, student_id).await?;

    Ok(Json(StudentDashboard {
        student,
        parent,
        assessments,
        insights,
        action_plans,
    }))
}

/// POST /api/v1/students/:student_id/analyze
///
/// Re-runs analysis on the newest assessment. A student with no assessments
/// gets a 200 with `status: "error"`.
pub async fn trigger_analysis(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let latest = match Uuid::parse_str(student_id.trim()) {
        Ok(id) => db::assessments::latest_for_student(&state.db, id).await?,
        Err(_) => None,
    };

    let Some(assessment) = latest else {
        return Ok(Json(json!({"status": "error", "message": NO_ASSESSMENT_MESSAGE})));
    };

    run_analysis(&state, assessment.id).await;

    Ok(Json(json!({"status": "success", "message": "Neural analysis complete"})))
}

fn required<'a>(value: &'a str, field: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

/// Build student routes
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route("/students/", post(create_student).get(list_students))
        .route("/students/:student_id", get(get_student_dashboard))
        .route("/students/:student_id/analyze", post(trigger_analysis))
}
