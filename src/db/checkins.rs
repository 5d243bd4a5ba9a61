use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbUserEmotion, NewCheckin, UserEmotion, decode_string_list};

#[instrument(skip(pool))]
pub async fn create_checkin(pool: &Pool<Sqlite>, user_id: i64, checkin: &NewCheckin) -> Result<UserEmotion, AppError> {
    info!("Recording check-in");
    let activities = serde_json::to_string(&checkin.activities)?;

    let res = sqlx::query(
        "INSERT INTO user_emotions (user_id, emotion, intensity, activities, note)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(checkin.emotion.trim())
    .bind(checkin.intensity)
    .bind(activities)
    .bind(checkin.note.as_deref())
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, DbUserEmotion>(
        "SELECT id, user_id, emotion, intensity, activities, note, created_at
         FROM user_emotions WHERE id = ?",
    )
    .bind(res.last_insert_rowid())
    .fetch_one(pool)
    .await?;

    Ok(UserEmotion::from(row))
}

#[instrument(skip(pool))]
pub async fn list_checkins(pool: &Pool<Sqlite>, user_id: i64, limit: i64) -> Result<Vec<UserEmotion>, AppError> {
    info!("Listing check-ins");
    let rows = sqlx::query_as::<_, DbUserEmotion>(
        "SELECT id, user_id, emotion, intensity, activities, note, created_at
         FROM user_emotions
         WHERE user_id = ?
         ORDER BY created_at DESC, id DESC
         LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserEmotion::from).collect())
}

/// Raw activity lists of a user's check-ins, oldest first.
#[instrument(skip(pool))]
pub async fn get_checkin_activity_lists(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Vec<String>>, AppError> {
    info!("Fetching check-in activities");
    let rows: Vec<Option<String>> = sqlx::query_scalar(
        "SELECT activities FROM user_emotions WHERE user_id = ? ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(decode_string_list).collect())
}
