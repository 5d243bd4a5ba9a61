use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    DailyReflection, DailyReflectionResponse, DbDailyReflection, DbDailyReflectionResponse,
    DbReflectionOverview, ReflectionOverview,
};

const REFLECTION_SELECT: &str =
    "SELECT id, user_id, question, created_at, updated_at FROM daily_reflections";

const RESPONSE_SELECT: &str = "SELECT id, reflection_id, user_id, response, is_completed, created_at, updated_at
     FROM daily_reflection_responses";

#[instrument(skip(pool))]
pub async fn create_reflection(pool: &Pool<Sqlite>, user_id: i64, question: &str) -> Result<i64, AppError> {
    info!("Creating daily reflection");
    let res = sqlx::query("INSERT INTO daily_reflections (user_id, question) VALUES (?, ?)")
        .bind(user_id)
        .bind(question.trim())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_reflection(pool: &Pool<Sqlite>, id: i64) -> Result<DailyReflection, AppError> {
    info!("Fetching daily reflection");
    let row = sqlx::query_as::<_, DbDailyReflection>(&format!("{REFLECTION_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(reflection) => Ok(DailyReflection::from(reflection)),
        _ => Err(AppError::NotFound(format!("Reflection {} not found", id))),
    }
}

/// Every reflection, newest first, with the given user's completion state.
#[instrument(skip(pool))]
pub async fn list_reflections_for(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<ReflectionOverview>, AppError> {
    info!("Listing daily reflections");
    let rows = sqlx::query_as::<_, DbReflectionOverview>(
        "SELECT d.id, d.user_id, d.question, d.created_at, d.updated_at, r.is_completed
         FROM daily_reflections d
         LEFT JOIN daily_reflection_responses r
             ON r.reflection_id = d.id AND r.user_id = ?
         ORDER BY d.created_at DESC, d.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ReflectionOverview::from).collect())
}

#[instrument(skip(pool))]
pub async fn list_created_reflections(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<DailyReflection>, AppError> {
    info!("Listing reflections created by user");
    let rows = sqlx::query_as::<_, DbDailyReflection>(&format!(
        "{REFLECTION_SELECT} WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(DailyReflection::from).collect())
}

/// Rewrites the question and `updated_at` only.
#[instrument(skip(pool))]
pub async fn update_reflection_question(
    pool: &Pool<Sqlite>,
    id: i64,
    question: &str,
) -> Result<DailyReflection, AppError> {
    info!("Updating reflection question");
    let now = Utc::now().naive_utc();

    let res = sqlx::query("UPDATE daily_reflections SET question = ?, updated_at = ? WHERE id = ?")
        .bind(question.trim())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Reflection {} not found", id)));
    }

    get_reflection(pool, id).await
}

/// Stores the user's answer, replacing an earlier one. A submitted answer
/// always marks the reflection as completed for that user.
#[instrument(skip(pool, response))]
pub async fn submit_reflection_response(
    pool: &Pool<Sqlite>,
    reflection_id: i64,
    user_id: i64,
    response: &str,
) -> Result<DailyReflectionResponse, AppError> {
    info!("Submitting reflection response");
    let now = Utc::now().naive_utc();

    sqlx::query(
        "INSERT INTO daily_reflection_responses
             (reflection_id, user_id, response, is_completed, created_at, updated_at)
         VALUES (?1, ?2, ?3, TRUE, ?4, ?4)
         ON CONFLICT (reflection_id, user_id)
         DO UPDATE SET response = excluded.response, is_completed = TRUE, updated_at = excluded.updated_at",
    )
    .bind(reflection_id)
    .bind(user_id)
    .bind(response)
    .bind(now)
    .execute(pool)
    .await?;

    get_reflection_response(pool, reflection_id, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Stored reflection response vanished".to_string()))
}

#[instrument(skip(pool))]
pub async fn get_reflection_response(
    pool: &Pool<Sqlite>,
    reflection_id: i64,
    user_id: i64,
) -> Result<Option<DailyReflectionResponse>, AppError> {
    let row = sqlx::query_as::<_, DbDailyReflectionResponse>(&format!(
        "{RESPONSE_SELECT} WHERE reflection_id = ? AND user_id = ?"
    ))
    .bind(reflection_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(DailyReflectionResponse::from))
}
