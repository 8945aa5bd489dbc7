//! Action plan database operations

use chrono::{DateTime, Utc};
use mentiscope_common::db::{ActionPlan, ActionStatus, NewActionPlan};
use mentiscope_common::time::{now, parse_db_timestamp, to_db_timestamp};
use mentiscope_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_optional_uuid, get_parsed, get_timestamp, get_uuid};

const ACTION_PLAN_COLUMNS: &str =
    "id, student_id, insight_id, title, description, role_target, status, due_date, created_at";

fn row_to_action_plan(row: &SqliteRow) -> Result<ActionPlan> {
    let due_date: Option<String> = row.try_get("due_date")?;

    Ok(ActionPlan {
        id: get_uuid(row, "id")?,
        student_id: get_uuid(row, "student_id")?,
        insight_id: get_optional_uuid(row, "insight_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        role_target: get_parsed(row, "role_target")?,
        status: get_parsed(row, "status")?,
        due_date: due_date.as_deref().map(parse_db_timestamp).transpose()?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

/// Insert one pending action plan, returning its id
pub async fn insert_action_plan(pool: &SqlitePool, plan: &NewActionPlan) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO action_plans (
            id, student_id, insight_id, title, description, role_target, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(plan.student_id.to_string())
    .bind(plan.insight_id.map(|i| i.to_string()))
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(plan.role_target.as_str())
    .bind(ActionStatus::Pending.as_str())
    .bind(to_db_timestamp(&now()))
    .execute(pool)
    .await?;

    Ok(id)
}

/// Load an action plan by id
pub async fn get_action_plan(pool: &SqlitePool, id: Uuid) -> Result<Option<ActionPlan>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM action_plans WHERE id = ?",
        ACTION_PLAN_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_action_plan).transpose()
}

/// All action plans of a student, newest first
pub async fn list_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<ActionPlan>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM action_plans WHERE student_id = ? ORDER BY created_at DESC, rowid DESC",
        ACTION_PLAN_COLUMNS
    ))
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_action_plan).collect()
}

/// Change the status of an action plan, and its due date when one is given
///
/// Returns the updated plan, or None if it does not exist.
pub async fn update_action_plan(
    pool: &SqlitePool,
    id: Uuid,
    status: ActionStatus,
    due_date: Option<DateTime<Utc>>,
) -> Result<Option<ActionPlan>> {
    let updated =
        sqlx::query("UPDATE action_plans SET status = ?, due_date = COALESCE(?, due_date) WHERE id = ?")
            .bind(status.as_str())
            .bind(due_date.as_ref().map(to_db_timestamp))
            .bind(id.to_string())
            .execute(pool)
            .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    get_action_plan(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{students, test_pool, users};
    use chrono::TimeZone;
    use mentiscope_common::db::RoleTarget;

    async fn new_plan(pool: &SqlitePool) -> NewActionPlan {
        let parent_id = Uuid::new_v4().to_string();
        users::ensure_parent(pool, &parent_id).await.unwrap();
        let student = students::insert_student(pool, &parent_id, "Sam", "8", None).await.unwrap();
        NewActionPlan {
            student_id: student.id,
            insight_id: None,
            title: "Parent Action".to_string(),
            description: "Agree on a screen-free hour before bed".to_string(),
            role_target: RoleTarget::Parent,
        }
    }

    #[tokio::test]
    async fn test_insert_starts_pending() {
        let pool = test_pool().await;
        let plan = new_plan(&pool).await;

        let id = insert_action_plan(&pool, &plan).await.unwrap();
        let loaded = get_action_plan(&pool, id).await.unwrap().unwrap();

        assert_eq!(loaded.status, ActionStatus::Pending);
        assert_eq!(loaded.role_target, RoleTarget::Parent);
        assert_eq!(loaded.description, plan.description);
    }

    #[tokio::test]
    async fn test_update_status() {
        let pool = test_pool().await;
        let plan = new_plan(&pool).await;
        let id = insert_action_plan(&pool, &plan).await.unwrap();

        let updated = update_action_plan(&pool, id, ActionStatus::InProgress, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ActionStatus::InProgress);
        assert!(updated.due_date.is_none());

        let listed = list_for_student(&pool, plan.student_id).await.unwrap();
        assert_eq!(listed[0].status, ActionStatus::InProgress);
    }

    #[tokio::test]
    async fn test_due_date_kept_when_omitted() {
        let pool = test_pool().await;
        let plan = new_plan(&pool).await;
        let id = insert_action_plan(&pool, &plan).await.unwrap();
        let due = Utc.with_ymd_and_hms(2025, 9, 1, 17, 0, 0).unwrap();

        let updated = update_action_plan(&pool, id, ActionStatus::InProgress, Some(due))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.due_date, Some(due));

        let updated = update_action_plan(&pool, id, ActionStatus::Completed, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ActionStatus::Completed);
        assert_eq!(updated.due_date, Some(due));
    }

    #[tokio::test]
    async fn test_update_status_missing_plan() {
        let pool = test_pool().await;
        let result = update_action_plan(&pool, Uuid::new_v4(), ActionStatus::Completed, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
