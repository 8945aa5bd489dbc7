//! End-to-end tests for submission → analysis → dashboard
//!
//! The LLM is replaced by a fake provider so the full fan-out runs without
//! network access.

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use helpers::{
    create_student, empty_request, extract_json, json_request, send, setup_test_db, FakeProvider,
};
use mentiscope_api::{build_router, AppState, Settings};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn analysis_reply() -> Value {
    json!({
        "readiness_score": 68,
        "confidence_level": 80,
        "overall_growth_summary": "Ada is building steady study routines.",
        "strengths": [
            {"title": "Curiosity", "explanation": "Explores topics beyond homework"},
            {"title": "Kindness", "explanation": "Supports classmates"}
        ],
        "support_areas": [{"title": "Focus", "explanation": "Drifts after 20 minutes"}],
        "risks": [{
            "name": "Sleep debt",
            "observations": "Bedtime after 11pm on school nights",
            "why_it_matters": "Sleep consolidates memory",
            "urgency": "Watch"
        }],
        "action_plan": {
            "student_actions": [
                {"task": "Lights out by 10pm", "type": "Habit"},
                {"task": "Pack bag tonight", "type": "Immediate"}
            ],
            "parent_actions": [{"task": "Sunday check-in", "type": "Habit"}],
            "environment_adjustments": ["Phone charges outside the bedroom"]
        }
    })
}

async fn app_with(provider: Arc<FakeProvider>) -> (Router, AppState) {
    let db = setup_test_db().await;
    let state = AppState::new(db, Settings::default())
        .unwrap()
        .with_analysis_provider(provider);
    (build_router(state.clone()), state)
}

async fn submit(app: &Router, student_id: &str, data: Value) -> Value {
    let payload = json!({"student_id": student_id, "assessment_type": "weekly_checkin", "data": data});
    let response = send(app, json_request("POST", "/api/v1/assessments/submit", &payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

async fn dashboard(app: &Router, student_id: &str) -> Value {
    let response = send(app, empty_request("GET", &format!("/api/v1/students/{}", student_id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

#[tokio::test]
async fn test_submission_fans_out_into_dashboard() {
    let provider = FakeProvider::replying(analysis_reply());
    let (app, _) = app_with(provider.clone()).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();

    let body = submit(&app, student_id, json!({"sleep_hours": 6})).await;
    assert_eq!(body["status"], "success");
    assert_eq!(provider.calls(), 1);

    let view = dashboard(&app, student_id).await;
    assert_eq!(view["readiness_score"], 68);

    let analysis = &view["assessments"][0]["analysis_results"];
    assert_eq!(analysis["dashboard_summary"], "Ada is building steady study routines.");
    assert_eq!(analysis["confidence_level"], 80);

    let insights = view["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 4);

    let summary = insights
        .iter()
        .find(|i| i["type"] == "trend")
        .expect("summary insight");
    assert_eq!(summary["title"], "Dashboard Summary");
    assert_eq!(summary["observation"], "Integrated whole-child mapping.");
    assert_eq!(summary["confidence_score"], 95);
    assert_eq!(summary["assessment_id"], body["assessment_id"]);
    assert_eq!(summary["is_viewed"], false);

    let strengths: Vec<_> = insights.iter().filter(|i| i["type"] == "strength").collect();
    assert_eq!(strengths.len(), 2);
    assert!(strengths.iter().all(|s| s["confidence_score"] == 90));

    let risk = insights.iter().find(|i| i["type"] == "risk").expect("risk insight");
    assert_eq!(risk["title"], "Sleep debt");
    assert_eq!(risk["interpretation"], "Sleep consolidates memory (Urgency: Watch)");

    let plans = view["action_plans"].as_array().unwrap();
    assert_eq!(plans.len(), 4);
    assert!(plans.iter().all(|p| p["status"] == "pending"));

    let student_plans = plans.iter().filter(|p| p["role_target"] == "student").count();
    let parent_plans = plans.iter().filter(|p| p["role_target"] == "parent").count();
    assert_eq!((student_plans, parent_plans), (2, 2));

    let environment = plans
        .iter()
        .find(|p| p["title"] == "Environment Adjustment")
        .expect("environment plan");
    assert_eq!(environment["description"], "Phone charges outside the bedroom");
    assert_eq!(environment["role_target"], "parent");
}

#[tokio::test]
async fn test_action_plan_status_update() {
    let (app, _) = app_with(FakeProvider::replying(analysis_reply())).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();
    submit(&app, student_id, json!({})).await;

    let view = dashboard(&app, student_id).await;
    let plan_id = view["action_plans"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/action-plans/{}", plan_id);

    let response = send(&app, json_request("PATCH", &uri, &json!({"status": "in_progress"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let plan = extract_json(response.into_body()).await;
    assert_eq!(plan["id"], plan_id);
    assert_eq!(plan["status"], "in_progress");

    let response = send(&app, json_request("PATCH", &uri, &json!({"status": "abandoned"}))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let view = dashboard(&app, student_id).await;
    let stored = view["action_plans"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == plan_id.as_str())
        .unwrap()
        .clone();
    assert_eq!(stored["status"], "in_progress");
}

#[tokio::test]
async fn test_reanalysis_uses_latest_assessment() {
    let provider = FakeProvider::replying(json!({"readiness_score": 150}));
    let (app, _) = app_with(provider.clone()).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();

    submit(&app, student_id, json!({"week": 1})).await;
    let second = submit(&app, student_id, json!({"week": 2})).await;

    let uri = format!("/api/v1/students/{}/analyze", student_id);
    let response = send(&app, empty_request("POST", &uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response.into_body()).await,
        json!({"status": "success", "message": "Neural analysis complete"})
    );
    assert_eq!(provider.calls(), 3);

    let view = dashboard(&app, student_id).await;
    // Clamped into range
    assert_eq!(view["readiness_score"], 100);

    // Newest assessment first; the re-run attached another summary to it
    assert_eq!(view["assessments"][0]["id"], second["assessment_id"]);
    let on_latest = view["insights"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["assessment_id"] == second["assessment_id"])
        .count();
    assert_eq!(on_latest, 2);

    // Fallback summary when the model gives none
    assert_eq!(
        view["assessments"][0]["analysis_results"]["dashboard_summary"],
        "Neural pulse synchronization complete. Dashboard updated with holistic baseline."
    );
}

#[tokio::test]
async fn test_provider_failure_does_not_fail_submission() {
    let provider = FakeProvider::failing();
    let (app, state) = app_with(provider.clone()).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();

    let body = submit(&app, student_id, json!({"mood": "tired"})).await;
    assert_eq!(body["status"], "success");
    assert_eq!(provider.calls(), 1);

    let view = dashboard(&app, student_id).await;
    assert_eq!(view["assessments"].as_array().unwrap().len(), 1);
    assert!(view["assessments"][0]["analysis_results"].is_null());
    assert_eq!(view["insights"], json!([]));
    assert_eq!(view["readiness_score"], 0);

    let last_error = state.last_error.read().await.clone().unwrap();
    assert!(last_error.contains("provider overloaded"));

    let response = send(&app, empty_request("GET", "/health")).await;
    let health = extract_json(response.into_body()).await;
    assert!(health["last_error"].as_str().unwrap().contains("provider overloaded"));
}

#[tokio::test]
async fn test_recovered_analysis_clears_last_error() {
    let provider = FakeProvider::failing_first(1, analysis_reply());
    let (app, state) = app_with(provider.clone()).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();

    submit(&app, student_id, json!({"week": 1})).await;
    assert!(state.last_error.read().await.is_some());

    submit(&app, student_id, json!({"week": 2})).await;
    assert_eq!(provider.calls(), 2);
    assert!(state.last_error.read().await.is_none());

    let response = send(&app, empty_request("GET", "/health")).await;
    let health = extract_json(response.into_body()).await;
    assert!(health.get("last_error").is_none());
}

#[tokio::test]
async fn test_dashboard_insights_link_to_references() {
    let mut reply = analysis_reply();
    reply["strengths"][0]["dimension"] = json!("cognitive_development");
    let (app, _) = app_with(FakeProvider::replying(reply)).await;
    let student = create_student(&app, &Uuid::new_v4().to_string(), "Ada").await;
    let student_id = student["id"].as_str().unwrap();
    submit(&app, student_id, json!({})).await;

    let view = dashboard(&app, student_id).await;
    let insights = view["insights"].as_array().unwrap();

    let curiosity = insights.iter().find(|i| i["title"] == "Curiosity").unwrap();
    assert_eq!(curiosity["dimension"], "cognitive_development");
    let citations = curiosity["scientific_references"].as_array().unwrap();
    assert!(!citations.is_empty());
    assert!(citations[0].as_str().unwrap().starts_with("Siegler, R. S., & Alibali, M. W. (2005)."));

    let kindness = insights.iter().find(|i| i["title"] == "Kindness").unwrap();
    assert!(kindness["dimension"].is_null());
    assert!(kindness["scientific_references"].is_null());

    let plan = &view["action_plans"][0];
    assert!(plan["due_date"].is_null());
    let uri = format!("/api/v1/action-plans/{}", plan["id"].as_str().unwrap());
    let response = send(
        &app,
        json_request("PATCH", &uri, &json!({"status": "in_progress", "due_date": "2025-09-01T17:00:00Z"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["due_date"], "2025-09-01T17:00:00Z");
}
