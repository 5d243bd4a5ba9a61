use rocket::State;
use rocket::serde::{Deserialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    create_reflection, get_reflection, get_reflection_response, list_created_reflections,
    list_reflections_for, submit_reflection_response, update_reflection_question,
};
use crate::envelope::{ApiResponse, ApiResult};
use crate::error::AppError;
use crate::models::{DailyReflection, DailyReflectionResponse, ReflectionOverview};
use crate::validation::{JsonValidateExt, not_blank};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 500, message = "Question must be less than 500 characters")
    )]
    reflection_question: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReflectionResponseRequest {
    #[validate(custom(function = "not_blank"))]
    response: String,
}

#[post("/reflection", data = "<reflection>")]
pub async fn api_create_reflection(
    reflection: Json<ReflectionRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<DailyReflection> {
    user.require_permission(Permission::CreateReflections)?;

    let reflection = reflection.validated()?;
    let id = create_reflection(db, user.id, &reflection.reflection_question).await?;

    Ok(ApiResponse::ok(get_reflection(db, id).await?, "Reflection created"))
}

#[get("/reflection")]
pub async fn api_list_reflections(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<ReflectionOverview>> {
    let reflections = list_reflections_for(db, user.id).await?;
    Ok(ApiResponse::ok(reflections, "Reflections fetched"))
}

#[get("/reflection/created")]
pub async fn api_created_reflections(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Vec<DailyReflection>> {
    let reflections = list_created_reflections(db, user.id).await?;
    Ok(ApiResponse::ok(reflections, "Created reflections fetched"))
}

#[get("/reflection/<id>")]
pub async fn api_get_reflection(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<DailyReflection> {
    let reflection = get_reflection(db, id).await?;
    Ok(ApiResponse::ok(reflection, "Reflection fetched"))
}

#[patch("/reflection/<id>", data = "<reflection>")]
pub async fn api_update_reflection(
    id: i64,
    reflection: Json<ReflectionRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<DailyReflection> {
    let existing = get_reflection(db, id).await?;

    if existing.user_id != user.id {
        return Err(AppError::Authorization(
            "Only the creator can edit this reflection".to_string(),
        ));
    }

    let reflection = reflection.validated()?;
    let updated = update_reflection_question(db, id, &reflection.reflection_question).await?;

    Ok(ApiResponse::ok(updated, "Reflection updated"))
}

#[post("/reflection/<id>/response", data = "<response>")]
pub async fn api_submit_response(
    id: i64,
    response: Json<ReflectionResponseRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<DailyReflectionResponse> {
    user.require_permission(Permission::Reflect)?;
    get_reflection(db, id).await?;

    let response = response.validated()?;
    let saved = submit_reflection_response(db, id, user.id, &response.response).await?;

    Ok(ApiResponse::ok(saved, "Response saved"))
}

#[get("/reflection/<id>/response")]
pub async fn api_get_response(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Option<DailyReflectionResponse>> {
    get_reflection(db, id).await?;

    let response = get_reflection_response(db, id, user.id).await?;
    let message = if response.is_some() {
        "Response fetched"
    } else {
        "No response yet"
    };

    Ok(ApiResponse::ok(response, message))
}
