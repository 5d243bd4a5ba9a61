use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Request, response};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The body of every API response, successful or not.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub data: Option<T>,
    pub message: String,
}

/// A successful handler result. The HTTP status mirrors `Envelope::status`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: Status,
    data: Option<T>,
    message: String,
}

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn into_envelope(self) -> Envelope<T> {
        Envelope {
            status: self.status.code,
            data: self.data,
            message: self.message,
        }
    }
}

impl ApiResponse<()> {
    /// A mutation with no payload; serialized as `"data": null`.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            data: None,
            message: message.into(),
        }
    }
}

impl<'r, T: Serialize> response::Responder<'r, 'static> for ApiResponse<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status;
        Custom(status, Json(self.into_envelope())).respond_to(req)
    }
}

/// Builds the envelope used by catchers, which never carry data.
pub fn error_envelope(status: Status, message: &str) -> Custom<Json<Envelope<()>>> {
    Custom(
        status,
        Json(Envelope {
            status: status.code,
            data: None,
            message: message.to_string(),
        }),
    )
}
