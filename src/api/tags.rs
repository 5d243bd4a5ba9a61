use rocket::State;
use sqlx::{Pool, Sqlite};

use crate::auth::User;
use crate::db::{get_checkin_activity_lists, get_resource_tag_lists};
use crate::envelope::{ApiResponse, ApiResult};
use crate::tags::normalize_tags;

#[get("/tags/checkins")]
pub async fn api_checkin_tags(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Vec<String>> {
    let lists = get_checkin_activity_lists(db, user.id).await?;
    Ok(ApiResponse::ok(
        normalize_tags(lists.into_iter().flatten()),
        "Check-in tags fetched",
    ))
}

#[get("/tags/resources")]
pub async fn api_resource_tags(_user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Vec<String>> {
    let lists = get_resource_tag_lists(db).await?;
    Ok(ApiResponse::ok(
        normalize_tags(lists.into_iter().flatten()),
        "Resource tags fetched",
    ))
}
