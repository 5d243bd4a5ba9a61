use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    Comment, CommentReply, DbComment, DbCommentReply, DbPost, LikeState, LikeTarget, Post,
};

const POST_SELECT: &str = "SELECT p.id, p.group_id, p.author_id, u.full_name AS author_name, p.content,
        (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'post' AND l.target_id = p.id) AS like_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
        p.created_at, p.updated_at
     FROM posts p
     JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id, u.full_name AS author_name, c.content,
        (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'comment' AND l.target_id = c.id) AS like_count,
        (SELECT COUNT(*) FROM comment_replies r WHERE r.comment_id = c.id) AS reply_count,
        c.created_at
     FROM comments c
     JOIN users u ON u.id = c.author_id";

const REPLY_SELECT: &str = "SELECT r.id, r.comment_id, r.author_id, u.full_name AS author_name, r.content,
        (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'reply' AND l.target_id = r.id) AS like_count,
        r.created_at
     FROM comment_replies r
     JOIN users u ON u.id = r.author_id";

#[instrument(skip(pool))]
pub async fn list_group_posts(pool: &Pool<Sqlite>, group_id: i64) -> Result<Vec<Post>, AppError> {
    info!("Listing group posts");
    let rows = sqlx::query_as::<_, DbPost>(&format!(
        "{POST_SELECT} WHERE p.group_id = ? ORDER BY p.created_at DESC, p.id DESC"
    ))
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Post::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_post(pool: &Pool<Sqlite>, id: i64) -> Result<Post, AppError> {
    info!("Fetching post");
    let row = sqlx::query_as::<_, DbPost>(&format!("{POST_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(post) => Ok(Post::from(post)),
        _ => Err(AppError::NotFound(format!("Post {} not found", id))),
    }
}

#[instrument(skip(pool, content))]
pub async fn create_post(
    pool: &Pool<Sqlite>,
    group_id: i64,
    author_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    info!("Creating post");
    let res = sqlx::query("INSERT INTO posts (group_id, author_id, content) VALUES (?, ?, ?)")
        .bind(group_id)
        .bind(author_id)
        .bind(content.trim())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, content))]
pub async fn update_post_content(pool: &Pool<Sqlite>, id: i64, content: &str) -> Result<(), AppError> {
    info!("Updating post content");
    let now = Utc::now().naive_utc();

    let res = sqlx::query("UPDATE posts SET content = ?, updated_at = ? WHERE id = ?")
        .bind(content.trim())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Post {} not found", id)));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn list_comments(pool: &Pool<Sqlite>, post_id: i64) -> Result<Vec<Comment>, AppError> {
    info!("Listing comments");
    let rows = sqlx::query_as::<_, DbComment>(&format!(
        "{COMMENT_SELECT} WHERE c.post_id = ? ORDER BY c.created_at, c.id"
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_comment(pool: &Pool<Sqlite>, id: i64) -> Result<Comment, AppError> {
    let row = sqlx::query_as::<_, DbComment>(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(comment) => Ok(Comment::from(comment)),
        _ => Err(AppError::NotFound(format!("Comment {} not found", id))),
    }
}

#[instrument(skip(pool, content))]
pub async fn create_comment(
    pool: &Pool<Sqlite>,
    post_id: i64,
    author_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    info!("Creating comment");
    let res = sqlx::query("INSERT INTO comments (post_id, author_id, content) VALUES (?, ?, ?)")
        .bind(post_id)
        .bind(author_id)
        .bind(content.trim())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn list_replies(pool: &Pool<Sqlite>, comment_id: i64) -> Result<Vec<CommentReply>, AppError> {
    info!("Listing replies");
    let rows = sqlx::query_as::<_, DbCommentReply>(&format!(
        "{REPLY_SELECT} WHERE r.comment_id = ? ORDER BY r.created_at, r.id"
    ))
    .bind(comment_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CommentReply::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_reply(pool: &Pool<Sqlite>, id: i64) -> Result<CommentReply, AppError> {
    let row = sqlx::query_as::<_, DbCommentReply>(&format!("{REPLY_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(reply) => Ok(CommentReply::from(reply)),
        _ => Err(AppError::NotFound(format!("Reply {} not found", id))),
    }
}

#[instrument(skip(pool, content))]
pub async fn create_reply(
    pool: &Pool<Sqlite>,
    comment_id: i64,
    author_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    info!("Creating reply");
    let res = sqlx::query(
        "INSERT INTO comment_replies (comment_id, author_id, content) VALUES (?, ?, ?)",
    )
    .bind(comment_id)
    .bind(author_id)
    .bind(content.trim())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Likes the target if the user hasn't yet, otherwise removes the like.
#[instrument(skip(pool))]
pub async fn toggle_like(
    pool: &Pool<Sqlite>,
    target: LikeTarget,
    target_id: i64,
    user_id: i64,
) -> Result<LikeState, AppError> {
    info!(target = target.as_str(), "Toggling like");

    let exists: Option<i64> =
        sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = ?", target.table()))
            .bind(target_id)
            .fetch_optional(pool)
            .await?;

    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "{} {} not found",
            target.as_str(),
            target_id
        )));
    }

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO likes (target_kind, target_id, user_id) VALUES (?, ?, ?)",
    )
    .bind(target.as_str())
    .bind(target_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    let liked = if inserted.rows_affected() > 0 {
        true
    } else {
        sqlx::query("DELETE FROM likes WHERE target_kind = ? AND target_id = ? AND user_id = ?")
            .bind(target.as_str())
            .bind(target_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        false
    };

    let like_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?")
            .bind(target.as_str())
            .bind(target_id)
            .fetch_one(pool)
            .await?;

    Ok(LikeState { liked, like_count })
}
