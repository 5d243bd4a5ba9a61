use rocket::State;
use rocket::serde::{Deserialize, json::Json};
use sqlx::{Pool, Sqlite};
use tracing::info;
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    create_group, create_post, get_group, get_group_members, get_post, is_group_member,
    join_group, list_group_posts, list_groups,
};
use crate::envelope::{ApiResponse, ApiResult};
use crate::error::AppError;
use crate::models::{Group, GroupMember, Post};
use crate::validation::{JsonValidateExt, not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(custom(function = "not_blank"))]
    category: String,
    #[validate(length(min = 3, max = 100, message = "Name must be 3-100 characters"))]
    name: String,
    #[serde(default)]
    description: String,
    #[validate(url(message = "Invalid image URL"))]
    image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPostRequest {
    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

#[get("/groups?<category>")]
pub async fn api_list_groups(
    category: Option<String>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<Group>> {
    let groups = list_groups(db, category.as_deref()).await?;
    Ok(ApiResponse::ok(groups, "Groups fetched"))
}

#[post("/groups", data = "<group>")]
pub async fn api_create_group(
    group: Json<CreateGroupRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Group> {
    user.require_permission(Permission::ManageGroups)?;

    let group = group.validated()?;
    let group_id = create_group(
        db,
        user.id,
        &group.category,
        &group.name,
        &group.description,
        group.image.as_deref(),
    )
    .await?;

    Ok(ApiResponse::ok(get_group(db, group_id).await?, "Group created"))
}

#[get("/groups/<id>")]
pub async fn api_get_group(id: i64, _user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Group> {
    let group = get_group(db, id).await?;
    Ok(ApiResponse::ok(group, "Group fetched"))
}

#[get("/groups/<id>/members")]
pub async fn api_group_members(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<GroupMember>> {
    get_group(db, id).await?;

    let members = get_group_members(db, id).await?;
    Ok(ApiResponse::ok(members, "Group members fetched"))
}

/// Joining twice is not an error; the message tells the two cases apart.
#[post("/groups/<id>/join")]
pub async fn api_join_group(id: i64, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Group> {
    user.require_permission(Permission::JoinGroups)?;
    get_group(db, id).await?;

    let joined = join_group(db, id, user.id).await?;
    let message = if joined {
        info!(group_id = id, user_id = user.id, "User joined group");
        "Joined group"
    } else {
        "Already a member of this group"
    };

    Ok(ApiResponse::ok(get_group(db, id).await?, message))
}

#[get("/groups/<id>/posts")]
pub async fn api_group_posts(id: i64, _user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Vec<Post>> {
    get_group(db, id).await?;

    let posts = list_group_posts(db, id).await?;
    Ok(ApiResponse::ok(posts, "Posts fetched"))
}

#[post("/groups/<id>/posts", data = "<post>")]
pub async fn api_create_group_post(
    id: i64,
    post: Json<NewPostRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Post> {
    user.require_permission(Permission::Post)?;
    get_group(db, id).await?;

    if !is_group_member(db, id, user.id).await? {
        return Err(AppError::Authorization(
            "Only group members can post in this group".to_string(),
        ));
    }

    let post = post.validated()?;
    let post_id = create_post(db, id, user.id, &post.content).await?;

    Ok(ApiResponse::ok(get_post(db, post_id).await?, "Post created"))
}
