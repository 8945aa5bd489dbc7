//! Assessment database operations

use mentiscope_common::db::{Assessment, AssessmentType};
use mentiscope_common::time::{now, to_db_timestamp};
use mentiscope_common::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_parsed, get_timestamp, get_uuid};

const ASSESSMENT_COLUMNS: &str = "id, student_id, type, data, analysis_results, created_at";

fn row_to_assessment(row: &SqliteRow) -> Result<Assessment> {
    let data: String = row.try_get("data")?;
    let data: Value = serde_json::from_str(&data)
        .map_err(|e| Error::Internal(format!("Failed to deserialize assessment data: {}", e)))?;

    let analysis_results: Option<String> = row.try_get("analysis_results")?;
    let analysis_results = analysis_results
        .map(|s| serde_json::from_str::<Value>(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to deserialize analysis results: {}", e)))?;

    Ok(Assessment {
        id: get_uuid(row, "id")?,
        student_id: get_uuid(row, "student_id")?,
        assessment_type: get_parsed(row, "type")?,
        data,
        analysis_results,
        created_at: get_timestamp(row, "created_at")?,
    })
}

/// Insert a new assessment with no analysis yet
pub async fn insert_assessment(
    pool: &SqlitePool,
    student_id: Uuid,
    assessment_type: AssessmentType,
    data: Value,
) -> Result<Assessment> {
    let assessment = Assessment {
        id: Uuid::new_v4(),
        student_id,
        assessment_type,
        data,
        analysis_results: None,
        created_at: now(),
    };

    let data_json = serde_json::to_string(&assessment.data)?;

    sqlx::query(
        r#"
        INSERT INTO assessments (id, student_id, type, data, analysis_results, created_at)
        VALUES (?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(assessment.id.to_string())
    .bind(assessment.student_id.to_string())
    .bind(assessment.assessment_type.as_str())
    .bind(data_json)
    .bind(to_db_timestamp(&assessment.created_at))
    .execute(pool)
    .await?;

    Ok(assessment)
}

/// Load an assessment by id
pub async fn get_assessment(pool: &SqlitePool, id: Uuid) -> Result<Option<Assessment>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM assessments WHERE id = ?",
        ASSESSMENT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_assessment).transpose()
}

/// All assessments of a student, newest first
pub async fn list_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<Assessment>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM assessments WHERE student_id = ? ORDER BY created_at DESC, rowid DESC",
        ASSESSMENT_COLUMNS
    ))
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_assessment).collect()
}

/// Most recent assessment of a student
pub async fn latest_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Option<Assessment>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM assessments WHERE student_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
        ASSESSMENT_COLUMNS
    ))
    .bind(student_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_assessment).transpose()
}

/// Up to `limit` other assessments of the same student, newest first
pub async fn history_for(
    pool: &SqlitePool,
    student_id: Uuid,
    exclude_id: Uuid,
    limit: i64,
) -> Result<Vec<Assessment>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM assessments WHERE student_id = ? AND id != ? \
         ORDER BY created_at DESC, rowid DESC LIMIT ?",
        ASSESSMENT_COLUMNS
    ))
    .bind(student_id.to_string())
    .bind(exclude_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_assessment).collect()
}

/// Store the analysis JSON on an assessment
pub async fn set_analysis_results(pool: &SqlitePool, id: Uuid, results: &Value) -> Result<()> {
    let results_json = serde_json::to_string(results)?;

    let updated = sqlx::query("UPDATE assessments SET analysis_results = ? WHERE id = ?")
        .bind(results_json)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Assessment {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{students, test_pool, users};
    use serde_json::json;

    async fn student(pool: &SqlitePool) -> Uuid {
        let parent_id = Uuid::new_v4().to_string();
        users::ensure_parent(pool, &parent_id).await.unwrap();
        students::insert_student(pool, &parent_id, "Sam", "6", None)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_insert_and_get_preserves_payload() {
        let pool = test_pool().await;
        let student_id = student(&pool).await;
        let data = json!({"q1_subject_difficulty": "Math", "q2_sleep_hours": 7});

        let inserted = insert_assessment(&pool, student_id, AssessmentType::Onboarding, data.clone())
            .await
            .unwrap();
        let loaded = get_assessment(&pool, inserted.id).await.unwrap().unwrap();

        assert_eq!(loaded, inserted);
        assert_eq!(loaded.data, data);
        assert_eq!(loaded.analysis_results, None);
    }

    #[tokio::test]
    async fn test_history_excludes_current_and_limits() {
        let pool = test_pool().await;
        let student_id = student(&pool).await;

        let mut ids = Vec::new();
        for week in 0..5 {
            let a = insert_assessment(
                &pool,
                student_id,
                AssessmentType::WeeklyCheckin,
                json!({ "week": week }),
            )
            .await
            .unwrap();
            ids.push(a.id);
        }
        let current = ids[4];

        let history = history_for(&pool, student_id, current, 3).await.unwrap();
        let history_ids: Vec<_> = history.iter().map(|a| a.id).collect();
        assert_eq!(history_ids, vec![ids[3], ids[2], ids[1]]);

        let latest = latest_for_student(&pool, student_id).await.unwrap().unwrap();
        assert_eq!(latest.id, current);
        assert_eq!(list_for_student(&pool, student_id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_set_analysis_results() {
        let pool = test_pool().await;
        let student_id = student(&pool).await;
        let a = insert_assessment(&pool, student_id, AssessmentType::AdHoc, json!({}))
            .await
            .unwrap();

        let results = json!({"readiness_score": 64, "dashboard_summary": "Steady week."});
        set_analysis_results(&pool, a.id, &results).await.unwrap();

        let loaded = get_assessment(&pool, a.id).await.unwrap().unwrap();
        assert_eq!(loaded.analysis_results, Some(results));
    }

    #[tokio::test]
    async fn test_set_analysis_results_missing_assessment() {
        let pool = test_pool().await;
        let result = set_analysis_results(&pool, Uuid::new_v4(), &json!({})).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
