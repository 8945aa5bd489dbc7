//! Student database operations

use mentiscope_common::db::Student;
use mentiscope_common::time::{now, to_db_timestamp};
use mentiscope_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_timestamp, get_uuid};

const STUDENT_COLUMNS: &str =
    "id, parent_id, name, grade_level, school_type, readiness_score, created_at";

/// Default school type for students created without one
pub const DEFAULT_SCHOOL_TYPE: &str = "Public";

fn row_to_student(row: &SqliteRow) -> Result<Student> {
    Ok(Student {
        id: get_uuid(row, "id")?,
        parent_id: row.try_get("parent_id")?,
        name: row.try_get("name")?,
        grade_level: row.try_get("grade_level")?,
        school_type: row.try_get("school_type")?,
        readiness_score: row.try_get("readiness_score")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

/// Insert a new student for an existing parent
pub async fn insert_student(
    pool: &SqlitePool,
    parent_id: &str,
    name: &str,
    grade_level: &str,
    school_type: Option<&str>,
) -> Result<Student> {
    let student = Student {
        id: Uuid::new_v4(),
        parent_id: parent_id.to_string(),
        name: name.to_string(),
        grade_level: grade_level.to_string(),
        school_type: Some(school_type.unwrap_or(DEFAULT_SCHOOL_TYPE).to_string()),
        readiness_score: 0,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO students (id, parent_id, name, grade_level, school_type, readiness_score, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student.id.to_string())
    .bind(&student.parent_id)
    .bind(&student.name)
    .bind(&student.grade_level)
    .bind(&student.school_type)
    .bind(student.readiness_score)
    .bind(to_db_timestamp(&student.created_at))
    .execute(pool)
    .await?;

    Ok(student)
}

/// Load a student by id
pub async fn get_student(pool: &SqlitePool, id: Uuid) -> Result<Option<Student>> {
    let row = sqlx::query(&format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_student).transpose()
}

/// Students owned by a parent, newest first
pub async fn list_for_parent(pool: &SqlitePool, parent_id: &str) -> Result<Vec<Student>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM students WHERE parent_id = ? ORDER BY created_at DESC, rowid DESC",
        STUDENT_COLUMNS
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_student).collect()
}

/// Overwrite the readiness score (clamped to 0-100)
pub async fn update_readiness_score(pool: &SqlitePool, id: Uuid, score: i64) -> Result<()> {
    sqlx::query("UPDATE students SET readiness_score = ? WHERE id = ?")
        .bind(score.clamp(0, 100))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, users};

    async fn parent(pool: &SqlitePool) -> String {
        let id = Uuid::new_v4().to_string();
        users::ensure_parent(pool, &id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_and_get_student() {
        let pool = test_pool().await;
        let parent_id = parent(&pool).await;

        let student = insert_student(&pool, &parent_id, "Sam", "5", None).await.unwrap();
        let loaded = get_student(&pool, student.id).await.unwrap().unwrap();

        assert_eq!(loaded, student);
        assert_eq!(loaded.school_type.as_deref(), Some(DEFAULT_SCHOOL_TYPE));
        assert_eq!(loaded.readiness_score, 0);
    }

    #[tokio::test]
    async fn test_get_missing_student() {
        let pool = test_pool().await;
        assert!(get_student(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_requires_parent() {
        let pool = test_pool().await;
        let result = insert_student(&pool, "nobody", "Orphan", "3", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_for_parent_newest_first() {
        let pool = test_pool().await;
        let parent_id = parent(&pool).await;
        let other_parent = parent(&pool).await;

        let older = insert_student(&pool, &parent_id, "Ada", "7", Some("Private")).await.unwrap();
        let newer = insert_student(&pool, &parent_id, "Ben", "2", None).await.unwrap();
        insert_student(&pool, &other_parent, "Cy", "9", None).await.unwrap();

        let listed = list_for_parent(&pool, &parent_id).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_readiness_score_is_clamped() {
        let pool = test_pool().await;
        let parent_id = parent(&pool).await;
        let student = insert_student(&pool, &parent_id, "Dee", "11", None).await.unwrap();

        update_readiness_score(&pool, student.id, 140).await.unwrap();
        assert_eq!(get_student(&pool, student.id).await.unwrap().unwrap().readiness_score, 100);

        update_readiness_score(&pool, student.id, -3).await.unwrap();
        assert_eq!(get_student(&pool, student.id).await.unwrap().unwrap().readiness_score, 0);

        update_readiness_score(&pool, student.id, 72).await.unwrap();
        assert_eq!(get_student(&pool, student.id).await.unwrap().unwrap().readiness_score, 72);
    }
}
