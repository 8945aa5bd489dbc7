//! Analysis dispatcher
//!
//! Turns one stored assessment into a readiness score, stored analysis JSON,
//! and a set of insight and action-plan rows:
//!
//! 1. Load the assessment, its student and up to [`HISTORY_LIMIT`] earlier assessments
//! 2. Build the prompt and ask the provider for a JSON object
//! 3. Fill in `dashboard_summary` when the model left it out
//! 4. Persist the readiness score and `analysis_results`
//! 5. Fan the reply out into rows, one insert at a time
//!
//! Rows are not wrapped in a transaction. A failure half way through the
//! fan-out leaves the rows written so far in place.

use mentiscope_common::db::{InsightType, NewActionPlan, NewInsight, RoleTarget};
use mentiscope_common::references::{format_citation, group_for};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::llm_client::{AnalysisProvider, LlmError};
use super::prompt::{build_prompt, SYSTEM_MESSAGE};
use crate::db;

/// Earlier assessments included as history
pub const HISTORY_LIMIT: i64 = 3;

pub const DEFAULT_DASHBOARD_SUMMARY: &str =
    "Neural pulse synchronization complete. Dashboard updated with holistic baseline.";

const SUMMARY_TITLE: &str = "Dashboard Summary";
const SUMMARY_OBSERVATION: &str = "Integrated whole-child mapping.";
const SUMMARY_CONFIDENCE: i64 = 95;
const STRENGTH_OBSERVATION: &str = "Area of core proficiency.";
const STRENGTH_CONFIDENCE: i64 = 90;
const RISK_CONFIDENCE: i64 = 85;

/// Dispatcher errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Storage failed: {0}")]
    Store(#[from] mentiscope_common::Error),
}

/// What a completed run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub assessment_id: Uuid,
    pub insights: usize,
    pub action_plans: usize,
    /// Clamped score written to the student, if the reply carried one
    pub readiness_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Nothing was sent to the provider
    Skipped(String),
    Completed(AnalysisSummary),
}

/// Run the full analysis pipeline for one assessment
///
/// `provider` is `None` when no LLM API key is configured.
pub async fn analyze_assessment(
    pool: &SqlitePool,
    provider: Option<&dyn AnalysisProvider>,
    assessment_id: Uuid,
) -> Result<AnalysisOutcome, AnalysisError> {
    let Some(provider) = provider else {
        info!(%assessment_id, "LLM API key not set, skipping analysis");
        return Ok(AnalysisOutcome::Skipped("LLM provider not configured".to_string()));
    };

    let Some(assessment) = db::assessments::get_assessment(pool, assessment_id).await? else {
        warn!(%assessment_id, "Assessment vanished before analysis");
        return Ok(AnalysisOutcome::Skipped("Assessment not found".to_string()));
    };

    let Some(student) = db::students::get_student(pool, assessment.student_id).await? else {
        warn!(%assessment_id, student_id = %assessment.student_id, "Student vanished before analysis");
        return Ok(AnalysisOutcome::Skipped("Student not found".to_string()));
    };

    let history: Vec<Value> =
        db::assessments::history_for(pool, student.id, assessment.id, HISTORY_LIMIT)
            .await?
            .into_iter()
            .map(|a| a.data)
            .collect();

    let prompt = build_prompt(&student, &assessment.data, &history)?;

    info!(
        %assessment_id,
        student_id = %student.id,
        history = history.len(),
        model = provider.model(),
        "Requesting analysis"
    );

    let mut analysis = provider.complete_json(SYSTEM_MESSAGE, &prompt).await?;
    normalize_analysis(&mut analysis);

    let readiness_score = readiness_from(&analysis);
    if let Some(score) = readiness_score {
        db::students::update_readiness_score(pool, student.id, score).await?;
    }
    db::assessments::set_analysis_results(pool, assessment.id, &analysis).await?;

    let insights = insights_from(student.id, assessment.id, &analysis);
    for insight in &insights {
        db::insights::insert_insight(pool, insight).await?;
    }

    let plans = action_plans_from(student.id, &analysis);
    for plan in &plans {
        db::action_plans::insert_action_plan(pool, plan).await?;
    }

    let summary = AnalysisSummary {
        assessment_id,
        insights: insights.len(),
        action_plans: plans.len(),
        readiness_score,
    };

    info!(
        %assessment_id,
        insights = summary.insights,
        action_plans = summary.action_plans,
        readiness = ?summary.readiness_score,
        "Analysis complete"
    );

    Ok(AnalysisOutcome::Completed(summary))
}

/// Fill `dashboard_summary` from `overall_growth_summary` or the fallback text
pub fn normalize_analysis(analysis: &mut Value) {
    let Some(map) = analysis.as_object_mut() else {
        return;
    };

    if map.contains_key("dashboard_summary") {
        return;
    }

    let summary = map
        .get("overall_growth_summary")
        .cloned()
        .unwrap_or_else(|| Value::String(DEFAULT_DASHBOARD_SUMMARY.to_string()));
    map.insert("dashboard_summary".to_string(), summary);
}

/// Readiness score from the reply, clamped to 0..=100
///
/// Fractional scores are rounded. Anything non-numeric is ignored.
pub fn readiness_from(analysis: &Value) -> Option<i64> {
    let value = analysis.get("readiness_score")?;
    let score = match value.as_i64() {
        Some(n) => n,
        None => value.as_f64()?.round() as i64,
    };
    Some(score.clamp(0, 100))
}

/// Summary, strength and risk insights, in that order
///
/// Items tagged with a known `dimension` carry that dimension's citations.
pub fn insights_from(student_id: Uuid, assessment_id: Uuid, analysis: &Value) -> Vec<NewInsight> {
    let insight = |insight_type, title: &str, observation: &str, interpretation: String, confidence| {
        NewInsight {
            student_id,
            assessment_id: Some(assessment_id),
            insight_type,
            title: title.to_string(),
            observation: observation.to_string(),
            interpretation,
            confidence_score: confidence,
            dimension: None,
            scientific_references: None,
        }
    };

    let summary = match analysis.get("dashboard_summary") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let mut insights = vec![insight(
        InsightType::Trend,
        SUMMARY_TITLE,
        SUMMARY_OBSERVATION,
        summary,
        SUMMARY_CONFIDENCE,
    )];

    for item in objects(analysis, "strengths") {
        let Some(title) = text(item, "title") else {
            debug!("Skipping strength without title");
            continue;
        };
        insights.push(with_dimension(
            insight(
                InsightType::Strength,
                title,
                STRENGTH_OBSERVATION,
                text(item, "explanation").unwrap_or_default().to_string(),
                STRENGTH_CONFIDENCE,
            ),
            item,
        ));
    }

    for item in objects(analysis, "risks") {
        let Some(name) = text(item, "name") else {
            debug!("Skipping risk without name");
            continue;
        };
        let why = text(item, "why_it_matters").unwrap_or_default();
        let interpretation = match text(item, "urgency") {
            Some(urgency) => format!("{} (Urgency: {})", why, urgency),
            None => why.to_string(),
        };
        insights.push(with_dimension(
            insight(
                InsightType::Risk,
                name,
                text(item, "observations").unwrap_or_default(),
                interpretation,
                RISK_CONFIDENCE,
            ),
            item,
        ));
    }

    insights
}

/// Attach the item's dimension and its APA citations
///
/// Keys missing from the reference catalog are dropped.
fn with_dimension(mut insight: NewInsight, item: &Map<String, Value>) -> NewInsight {
    let Some(key) = text(item, "dimension") else {
        return insight;
    };
    let Some(group) = group_for(key) else {
        debug!(dimension = key, "Ignoring unknown dimension");
        return insight;
    };

    insight.dimension = Some(group.key.to_string());
    insight.scientific_references = Some(Value::Array(
        group
            .references
            .iter()
            .map(|r| Value::String(format_citation(r)))
            .collect(),
    ));
    insight
}

/// Student, parent and environment action plans, in that order
pub fn action_plans_from(student_id: Uuid, analysis: &Value) -> Vec<NewActionPlan> {
    let Some(plan) = analysis.get("action_plan").and_then(Value::as_object) else {
        return Vec::new();
    };

    let groups = [
        ("student_actions", "Student Action", RoleTarget::Student),
        ("parent_actions", "Parent Action", RoleTarget::Parent),
        ("environment_adjustments", "Environment Adjustment", RoleTarget::Parent),
    ];

    let mut plans = Vec::new();
    for (key, base_title, role_target) in groups {
        let Some(items) = plan.get(key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            let Some((title, description)) = action_entry(base_title, item) else {
                debug!(section = key, "Skipping malformed action");
                continue;
            };
            plans.push(NewActionPlan {
                student_id,
                insight_id: None,
                title,
                description,
                role_target,
            });
        }
    }
    plans
}

/// Title and description for one action item
///
/// Accepts either a bare string or `{"task": ..., "type": ...}`.
fn action_entry(base_title: &str, item: &Value) -> Option<(String, String)> {
    match item {
        Value::String(task) if !task.trim().is_empty() => {
            Some((base_title.to_string(), task.clone()))
        }
        Value::Object(map) => {
            let task = text(map, "task")?;
            let title = match text(map, "type") {
                Some(kind) => format!("{} ({})", base_title, kind),
                None => base_title.to_string(),
            };
            Some((title, task.to_string()))
        }
        _ => None,
    }
}

/// Object entries of an array section; other entries are dropped
fn objects<'a>(analysis: &'a Value, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    analysis
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Trimmed, non-empty string field
fn text<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
