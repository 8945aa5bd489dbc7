//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates every table if missing.
//! All statements are idempotent, so startup is safe to repeat.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets dashboard reads proceed while an analysis run is writing
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_users_table(pool).await?;
    create_students_table(pool).await?;
    create_assessments_table(pool).await?;
    create_insights_table(pool).await?;
    create_action_plans_table(pool).await?;

    info!("Database tables initialized (users, students, assessments, insights, action_plans)");
    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT,
            role TEXT NOT NULL DEFAULT 'parent',
            is_subscribed INTEGER NOT NULL DEFAULT 0,
            subscription_status TEXT NOT NULL DEFAULT 'inactive',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the students table
pub async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            parent_id TEXT NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            grade_level TEXT NOT NULL,
            school_type TEXT,
            readiness_score INTEGER NOT NULL DEFAULT 0
                CHECK (readiness_score BETWEEN 0 AND 100),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_parent ON students(parent_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the assessments table
pub async fn create_assessments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assessments (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(id),
            type TEXT NOT NULL DEFAULT 'onboarding',
            data TEXT NOT NULL,
            analysis_results TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_assessments_student_created \
         ON assessments(student_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the insights table
pub async fn create_insights_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insights (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(id),
            assessment_id TEXT REFERENCES assessments(id),
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            observation TEXT NOT NULL,
            interpretation TEXT NOT NULL,
            confidence_score INTEGER NOT NULL DEFAULT 0,
            dimension TEXT,
            scientific_references TEXT,
            is_viewed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_insights_student ON insights(student_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the action_plans table
pub async fn create_action_plans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS action_plans (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(id),
            insight_id TEXT REFERENCES insights(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            role_target TEXT NOT NULL DEFAULT 'parent',
            status TEXT NOT NULL DEFAULT 'pending',
            due_date TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_action_plans_student ON action_plans(student_id)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_database_creates_file_and_tables() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("sub").join("mentiscope.db");

        let pool = init_database(&db_path).await.unwrap();

        assert!(db_path.exists());
        let tables = table_names(&pool).await;
        for expected in ["action_plans", "assessments", "insights", "students", "users"] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();

        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        assert_eq!(table_names(&pool).await.len(), 5);
    }

    #[tokio::test]
    async fn test_assessment_requires_existing_student() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO assessments (id, student_id, type, data, created_at) \
             VALUES ('a', 'missing-student', 'onboarding', '{}', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "foreign key should reject orphan assessment");
    }
}
