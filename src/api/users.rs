use rocket::State;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{get_onboarding_status, get_roles, get_user, update_user, update_user_role};
use crate::error::AppError;
use crate::envelope::{ApiResponse, ApiResult};
use crate::models::{RoleRecord, UserChanges, UserProfile};
use crate::validation::{JsonValidateExt, USERNAME_RE, not_blank};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(custom(function = "not_blank"))]
    full_name: Option<String>,
    #[validate(regex(
        path = *USERNAME_RE,
        message = "Username must be 3-32 letters, digits, '_' or '.'"
    ))]
    username: Option<String>,
    #[validate(url(message = "Invalid profile picture URL"))]
    profile_pic_url: Option<String>,
    #[validate(length(max = 200, message = "Expertise must be less than 200 characters"))]
    expertise: Option<String>,
    onboarding_completed: Option<bool>,
    role: Option<Role>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            full_name: request.full_name,
            username: request.username,
            profile_pic_url: request.profile_pic_url,
            expertise: request.expertise,
            onboarding_completed: request.onboarding_completed,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[validate(regex(
        path = *USERNAME_RE,
        message = "Username must be 3-32 letters, digits, '_' or '.'"
    ))]
    username: String,
    #[validate(length(max = 200, message = "Expertise must be less than 200 characters"))]
    expertise: Option<String>,
    #[validate(url(message = "Invalid profile picture URL"))]
    profile_pic_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub is_completed: bool,
}

#[get("/users/<id>")]
pub async fn api_get_user(id: i64, user: User, db: &State<Pool<Sqlite>>) -> ApiResult<UserProfile> {
    user.require_permission(Permission::ViewProfiles)?;

    let profile = get_user(db, id).await?;

    Ok(ApiResponse::ok(
        UserProfile::for_viewer(profile, &user),
        "User fetched",
    ))
}

#[patch("/users/<id>", data = "<update>")]
pub async fn api_update_user(
    id: i64,
    update: Json<UpdateUserRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<UserProfile> {
    user.require_owner_or(
        id,
        Permission::EditAnyUser,
        "You can only edit your own profile",
    )?;

    let mut update = update.validated()?;
    let role = update.role.take();

    if let Some(role) = role {
        user.require_permission(Permission::EditUserRoles)?;
        if id == user.id && role != user.role {
            return Err(AppError::Authorization(
                "You cannot change your own role".to_string(),
            ));
        }
    }

    let changes = UserChanges::from(update);
    let mut updated = update_user(db, id, &changes).await?;

    if let Some(role) = role.filter(|role| *role != updated.role) {
        update_user_role(db, id, role).await?;
        updated = get_user(db, id).await?;
    }

    Ok(ApiResponse::ok(
        UserProfile::for_viewer(updated, &user),
        "User updated",
    ))
}

#[get("/onboarding-status")]
pub async fn api_onboarding_status(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<OnboardingStatus> {
    let is_completed = get_onboarding_status(db, user.id).await?;

    Ok(ApiResponse::ok(
        OnboardingStatus { is_completed },
        "Onboarding status fetched",
    ))
}

#[post("/onboarding", data = "<onboarding>")]
pub async fn api_complete_onboarding(
    onboarding: Json<OnboardingRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<User> {
    user.require_permission(Permission::EditOwnProfile)?;

    let onboarding = onboarding.validated()?;
    let changes = UserChanges {
        username: Some(onboarding.username),
        expertise: onboarding.expertise,
        profile_pic_url: onboarding.profile_pic_url,
        onboarding_completed: Some(true),
        ..Default::default()
    };

    let updated = update_user(db, user.id, &changes).await?;

    Ok(ApiResponse::ok(updated, "Onboarding completed"))
}

#[get("/roles")]
pub async fn api_roles(_user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Vec<RoleRecord>> {
    let roles = get_roles(db).await?;
    Ok(ApiResponse::ok(roles, "Roles fetched"))
}
