use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbGroup, DbGroupMember, Group, GroupMember};

const GROUP_SELECT: &str = "SELECT g.id, g.category, g.name, g.description, g.image,
        (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id) AS member_count,
        g.created_at
     FROM support_groups g";

#[instrument(skip(pool))]
pub async fn list_groups(pool: &Pool<Sqlite>, category: Option<&str>) -> Result<Vec<Group>, AppError> {
    info!("Listing groups");
    let rows = sqlx::query_as::<_, DbGroup>(&format!(
        "{GROUP_SELECT} WHERE (?1 IS NULL OR g.category = ?1) ORDER BY g.name"
    ))
    .bind(category)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Group::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_group(pool: &Pool<Sqlite>, id: i64) -> Result<Group, AppError> {
    info!("Fetching group");
    let row = sqlx::query_as::<_, DbGroup>(&format!("{GROUP_SELECT} WHERE g.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(group) => Ok(Group::from(group)),
        _ => Err(AppError::NotFound(format!("Group {} not found", id))),
    }
}

#[instrument(skip(pool))]
pub async fn create_group(
    pool: &Pool<Sqlite>,
    created_by: i64,
    category: &str,
    name: &str,
    description: &str,
    image: Option<&str>,
) -> Result<i64, AppError> {
    info!("Creating group");
    let res = sqlx::query(
        "INSERT INTO support_groups (category, name, description, image, created_by)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(category.trim())
    .bind(name.trim())
    .bind(description)
    .bind(image)
    .bind(created_by)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "A group with this name already exists"))?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_group_members(pool: &Pool<Sqlite>, group_id: i64) -> Result<Vec<GroupMember>, AppError> {
    info!("Fetching group members");
    let rows = sqlx::query_as::<_, DbGroupMember>(
        "SELECT m.user_id, u.full_name, u.username, u.profile_pic_url, m.joined_at
         FROM group_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.group_id = ?
         ORDER BY m.joined_at, m.user_id",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(GroupMember::from).collect())
}

/// Adds the membership if missing. Returns whether a row was inserted.
#[instrument(skip(pool))]
pub async fn join_group(pool: &Pool<Sqlite>, group_id: i64, user_id: i64) -> Result<bool, AppError> {
    info!("Joining group");
    let now = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?, ?, ?)",
    )
    .bind(group_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(res.rows_affected() > 0)
}

#[instrument(skip(pool))]
pub async fn is_group_member(pool: &Pool<Sqlite>, group_id: i64, user_id: i64) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}
