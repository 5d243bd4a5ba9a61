use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::SqlitePool;
use tracing::Instrument;

use crate::db::resolve_session;
use crate::envelope::{Envelope, error_envelope};
use crate::error::AppError;

use super::User;

pub const SESSION_COOKIE: &str = "session_token";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = AppError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");

        match authenticate(request).instrument(auth_span).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => Outcome::Error((err.status_code(), err)),
        }
    }
}

async fn authenticate(request: &Request<'_>) -> Result<User, AppError> {
    let token = request
        .cookies()
        .get_private(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Authentication("No session".to_string()))?;

    let db = match request.rocket().state::<SqlitePool>() {
        Some(pool) => pool,
        _ => {
            tracing::error!("Database pool not found in managed state");
            return Err(AppError::Internal("Database pool not managed".to_string()));
        }
    };

    match resolve_session(db, &token).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, role = %user.role.as_str(), "User authenticated via session token");
            Ok(user)
        }
        Err(err) => {
            err.log_and_record("Resolving session");
            Err(err)
        }
    }
}

#[catch(400)]
pub fn bad_request_api(_req: &Request) -> Custom<Json<Envelope<()>>> {
    error_envelope(Status::BadRequest, "Malformed request")
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Envelope<()>>> {
    error_envelope(Status::Unauthorized, "Authentication required")
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<Envelope<()>>> {
    error_envelope(
        Status::Forbidden,
        "You don't have permission to perform this action",
    )
}

#[catch(404)]
pub fn not_found_api(_req: &Request) -> Custom<Json<Envelope<()>>> {
    error_envelope(Status::NotFound, "Resource not found")
}

#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> Custom<Json<Envelope<()>>> {
    error_envelope(Status::UnprocessableEntity, "Request body could not be parsed")
}

#[catch(default)]
pub fn default_api(status: Status, _req: &Request) -> Custom<Json<Envelope<()>>> {
    let message = match status.code {
        500..=599 => "Internal server error",
        _ => status.reason().unwrap_or("An error occurred"),
    };
    error_envelope(status, message)
}
