use chrono::Utc;
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::serde::{Deserialize, json::Json};
use sqlx::{Pool, Sqlite};
use tracing::info;
use validator::Validate;

use crate::auth::{Role, SESSION_COOKIE, User, UserSession};
use crate::db::{authenticate_user, create_user, create_user_session, get_user, invalidate_session};
use crate::env::AppConfig;
use crate::envelope::{ApiResponse, ApiResult};
use crate::error::AppError;
use crate::validation::{JsonValidateExt, not_blank};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    #[validate(custom(function = "not_blank"))]
    full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    password: String,
}

#[post("/auth/register", data = "<registration>")]
pub async fn api_register(
    registration: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<User> {
    let registration = registration.validated()?;

    let user_id = create_user(
        db,
        &registration.email,
        &registration.password,
        &registration.full_name,
        Role::Member,
    )
    .await?;

    let user = get_user(db, user_id).await?;
    info!(user_id = user.id, "Registered new user");

    Ok(ApiResponse::ok(user, "Account created"))
}

#[post("/auth/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<User> {
    let login = login.validated()?;

    let Some(user) = authenticate_user(db, &login.email, &login.password).await? else {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    };

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + config.session_ttl;

    create_user_session(db, user.id, &token, expires_at.naive_utc()).await?;

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, token))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::seconds(
                config.session_ttl.num_seconds(),
            )),
    );

    info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::ok(user, "Logged in"))
}

/// Always succeeds so a client with a stale cookie can still clear it.
#[post("/auth/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> ApiResult<()> {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        invalidate_session(db, cookie.value()).await?;
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));

    Ok(ApiResponse::done("Logged out"))
}

#[get("/auth/session")]
pub async fn api_session(user: User) -> ApiResult<User> {
    Ok(ApiResponse::ok(user, "Session is active"))
}
