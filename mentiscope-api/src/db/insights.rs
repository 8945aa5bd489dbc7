//! Insight database operations

use mentiscope_common::db::{Insight, NewInsight};
use mentiscope_common::time::{now, to_db_timestamp};
use mentiscope_common::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_optional_uuid, get_parsed, get_timestamp, get_uuid};

const INSIGHT_COLUMNS: &str = "id, student_id, assessment_id, type, title, observation, \
     interpretation, confidence_score, dimension, scientific_references, is_viewed, created_at";

fn row_to_insight(row: &SqliteRow) -> Result<Insight> {
    let references: Option<String> = row.try_get("scientific_references")?;
    let scientific_references = references
        .map(|s| serde_json::from_str::<Value>(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to deserialize insight references: {}", e)))?;

    Ok(Insight {
        id: get_uuid(row, "id")?,
        student_id: get_uuid(row, "student_id")?,
        assessment_id: get_optional_uuid(row, "assessment_id")?,
        insight_type: get_parsed(row, "type")?,
        title: row.try_get("title")?,
        observation: row.try_get("observation")?,
        interpretation: row.try_get("interpretation")?,
        confidence_score: row.try_get("confidence_score")?,
        dimension: row.try_get("dimension")?,
        scientific_references,
        is_viewed: row.try_get("is_viewed")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

/// Insert one insight row, returning its id
pub async fn insert_insight(pool: &SqlitePool, insight: &NewInsight) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let references = insight
        .scientific_references
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO insights (
            id, student_id, assessment_id, type, title, observation, interpretation,
            confidence_score, dimension, scientific_references, is_viewed, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(insight.student_id.to_string())
    .bind(insight.assessment_id.map(|a| a.to_string()))
    .bind(insight.insight_type.as_str())
    .bind(&insight.title)
    .bind(&insight.observation)
    .bind(&insight.interpretation)
    .bind(insight.confidence_score.clamp(0, 100))
    .bind(&insight.dimension)
    .bind(references)
    .bind(to_db_timestamp(&now()))
    .execute(pool)
    .await?;

    Ok(id)
}

/// All insights of a student, newest first
pub async fn list_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<Insight>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM insights WHERE student_id = ? ORDER BY created_at DESC, rowid DESC",
        INSIGHT_COLUMNS
    ))
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_insight).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{students, test_pool, users};
    use mentiscope_common::db::InsightType;

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = test_pool().await;
        let parent_id = Uuid::new_v4().to_string();
        users::ensure_parent(&pool, &parent_id).await.unwrap();
        let student = students::insert_student(&pool, &parent_id, "Sam", "4", None).await.unwrap();

        let first = NewInsight {
            student_id: student.id,
            assessment_id: None,
            insight_type: InsightType::Strength,
            title: "Curiosity".to_string(),
            observation: "Area of core proficiency.".to_string(),
            interpretation: "Asks follow-up questions.".to_string(),
            confidence_score: 90,
            dimension: None,
            scientific_references: None,
        };
        let second = NewInsight {
            insight_type: InsightType::Risk,
            title: "Sleep debt".to_string(),
            confidence_score: 185,
            dimension: Some("sleep_health".to_string()),
            scientific_references: Some(serde_json::json!(["Walker, M. (2017). Why We Sleep."])),
            ..first.clone()
        };

        let first_id = insert_insight(&pool, &first).await.unwrap();
        let second_id = insert_insight(&pool, &second).await.unwrap();

        let listed = list_for_student(&pool, student.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second_id);
        assert_eq!(listed[0].insight_type, InsightType::Risk);
        assert_eq!(listed[0].confidence_score, 100);
        assert_eq!(listed[0].dimension.as_deref(), Some("sleep_health"));
        assert_eq!(
            listed[0].scientific_references,
            Some(serde_json::json!(["Walker, M. (2017). Why We Sleep."]))
        );
        assert!(listed[1].dimension.is_none());
        assert!(listed[1].scientific_references.is_none());
        assert_eq!(listed[1].id, first_id);
        assert_eq!(listed[1].title, "Curiosity");
        assert!(!listed[1].is_viewed);
    }
}
