use rocket::State;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use super::groups::NewPostRequest;
use crate::auth::{Permission, User};
use crate::db::{
    create_comment, create_reply, get_comment, get_post, get_reply, is_group_member, list_comments,
    list_replies, toggle_like, update_post_content,
};
use crate::envelope::{ApiResponse, ApiResult};
use crate::error::AppError;
use crate::models::{Comment, CommentReply, LikeState, LikeTarget, Post};
use crate::validation::JsonValidateExt;

#[get("/posts/<id>")]
pub async fn api_get_post(id: i64, _user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Post> {
    let post = get_post(db, id).await?;
    Ok(ApiResponse::ok(post, "Post fetched"))
}

#[patch("/posts/<id>", data = "<post>")]
pub async fn api_update_post(
    id: i64,
    post: Json<NewPostRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Post> {
    let existing = get_post(db, id).await?;

    if existing.author_id != user.id {
        return Err(AppError::Authorization(
            "Only the author can edit this post".to_string(),
        ));
    }

    let post = post.validated()?;
    update_post_content(db, id, &post.content).await?;

    Ok(ApiResponse::ok(get_post(db, id).await?, "Post updated"))
}

#[post("/posts/<id>/like")]
pub async fn api_like_post(id: i64, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<LikeState> {
    like(db, &user, LikeTarget::Post, id).await
}

#[get("/posts/<id>/comments")]
pub async fn api_post_comments(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<Comment>> {
    get_post(db, id).await?;

    let comments = list_comments(db, id).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched"))
}

#[post("/posts/<id>/comments", data = "<comment>")]
pub async fn api_create_comment(
    id: i64,
    comment: Json<NewPostRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Comment> {
    user.require_permission(Permission::Post)?;
    let post = get_post(db, id).await?;
    require_membership(db, &user, post.group_id).await?;

    let comment = comment.validated()?;
    let comment_id = create_comment(db, id, user.id, &comment.content).await?;

    Ok(ApiResponse::ok(get_comment(db, comment_id).await?, "Comment created"))
}

#[post("/comments/<id>/like")]
pub async fn api_like_comment(id: i64, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<LikeState> {
    like(db, &user, LikeTarget::Comment, id).await
}

#[get("/comments/<id>/replies")]
pub async fn api_comment_replies(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<CommentReply>> {
    get_comment(db, id).await?;

    let replies = list_replies(db, id).await?;
    Ok(ApiResponse::ok(replies, "Replies fetched"))
}

#[post("/comments/<id>/replies", data = "<reply>")]
pub async fn api_create_reply(
    id: i64,
    reply: Json<NewPostRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<CommentReply> {
    user.require_permission(Permission::Post)?;
    let comment = get_comment(db, id).await?;
    let post = get_post(db, comment.post_id).await?;
    require_membership(db, &user, post.group_id).await?;

    let reply = reply.validated()?;
    let reply_id = create_reply(db, id, user.id, &reply.content).await?;

    Ok(ApiResponse::ok(get_reply(db, reply_id).await?, "Reply created"))
}

#[post("/replies/<id>/like")]
pub async fn api_like_reply(id: i64, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<LikeState> {
    like(db, &user, LikeTarget::Reply, id).await
}

async fn require_membership(db: &Pool<Sqlite>, user: &User, group_id: i64) -> Result<(), AppError> {
    if is_group_member(db, group_id, user.id).await? {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "Only group members can comment in this group".to_string(),
        ))
    }
}

async fn like(db: &Pool<Sqlite>, user: &User, target: LikeTarget, id: i64) -> ApiResult<LikeState> {
    user.require_permission(Permission::Post)?;

    let state = toggle_like(db, target, id, user.id).await?;
    let message = if state.liked { "Liked" } else { "Like removed" };

    Ok(ApiResponse::ok(state, message))
}
