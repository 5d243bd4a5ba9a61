use rocket::State;
use rocket::serde::{Deserialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{create_checkin, list_checkins};
use crate::envelope::{ApiResponse, ApiResult};
use crate::models::{NewCheckin, UserEmotion};
use crate::validation::{JsonValidateExt, not_blank, tags_not_blank};

const DEFAULT_LIMIT: i64 = 30;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckinRequest {
    #[validate(custom(function = "not_blank"))]
    emotion: String,
    #[validate(range(min = 1, max = 10, message = "Intensity must be between 1 and 10"))]
    intensity: i64,
    #[serde(default)]
    #[validate(custom(function = "tags_not_blank"))]
    activities: Vec<String>,
    #[validate(length(max = 1000, message = "Note must be less than 1000 characters"))]
    note: Option<String>,
}

impl From<CheckinRequest> for NewCheckin {
    fn from(request: CheckinRequest) -> Self {
        Self {
            emotion: request.emotion,
            intensity: request.intensity,
            activities: request.activities,
            note: request.note,
        }
    }
}

#[post("/checkins", data = "<checkin>")]
pub async fn api_create_checkin(
    checkin: Json<CheckinRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<UserEmotion> {
    user.require_permission(Permission::CheckIn)?;

    let checkin = NewCheckin::from(checkin.validated()?);
    let saved = create_checkin(db, user.id, &checkin).await?;

    Ok(ApiResponse::ok(saved, "Check-in recorded"))
}

#[get("/checkins?<limit>")]
pub async fn api_list_checkins(
    limit: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<UserEmotion>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let checkins = list_checkins(db, user.id, limit).await?;
    Ok(ApiResponse::ok(checkins, "Check-ins fetched"))
}
