//! User (parent account) database operations

use mentiscope_common::db::{SubscriptionStatus, User, UserRole};
use mentiscope_common::time::{now, to_db_timestamp};
use mentiscope_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{get_parsed, get_timestamp};

const USER_COLUMNS: &str =
    "id, email, full_name, role, is_subscribed, subscription_status, created_at";

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        role: get_parsed(row, "role")?,
        is_subscribed: row.try_get("is_subscribed")?,
        subscription_status: get_parsed(row, "subscription_status")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

/// Insert a new parent account with an explicit id
///
/// Ids are opaque strings issued by the identity provider.
pub async fn insert_user(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    full_name: Option<&str>,
) -> Result<User> {
    let user = User {
        id: id.to_string(),
        email: email.to_string(),
        full_name: full_name.map(str::to_string),
        role: UserRole::Parent,
        is_subscribed: false,
        subscription_status: SubscriptionStatus::Inactive,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, full_name, role, is_subscribed, subscription_status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(user.role.as_str())
    .bind(user.is_subscribed)
    .bind(user.subscription_status.as_str())
    .bind(to_db_timestamp(&user.created_at))
    .execute(pool)
    .await?;

    Ok(user)
}

/// Load a user by id
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Return the parent with `id`, creating a placeholder account if absent
///
/// The placeholder uses `<id>@example.com` until the identity provider
/// supplies a real address.
pub async fn ensure_parent(pool: &SqlitePool, id: &str) -> Result<User> {
    if let Some(user) = get_user(pool, id).await? {
        return Ok(user);
    }

    let email = format!("{}@example.com", id);
    tracing::info!(parent_id = id, "Creating placeholder parent account");
    insert_user(pool, id, &email, None).await
}

/// Set subscription state for the user with `email`
///
/// Returns false when no such user exists.
pub async fn set_subscription_by_email(
    pool: &SqlitePool,
    email: &str,
    status: SubscriptionStatus,
) -> Result<bool> {
    let is_subscribed = status == SubscriptionStatus::Active;

    let result = sqlx::query(
        "UPDATE users SET subscription_status = ?, is_subscribed = ? WHERE email = ? COLLATE NOCASE",
    )
    .bind(status.as_str())
    .bind(is_subscribed)
    .bind(email.trim())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
