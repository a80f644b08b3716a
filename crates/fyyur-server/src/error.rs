use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::DbErr;
use serde::Serialize;

/// Body of the dedicated error pages; 404 and 500 responses both render one.
#[derive(Debug, Serialize)]
pub struct ErrorPage {
    pub status: u16,
    pub flash: String,
}

/// Handler-boundary error. Database failures are logged here and surface to
/// the client only as a flash message with the matching status code.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Flash(StatusCode, String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// Persistence failure: log the cause, flash the user-facing message.
    pub fn db(err: DbErr, flash: impl Into<String>) -> Self {
        tracing::error!("database error: {err}");
        Self::Flash(StatusCode::INTERNAL_SERVER_ERROR, flash.into())
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::db(err, "An error occurred. Please try again later.")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, flash) = match self {
            Self::NotFound(flash) => (StatusCode::NOT_FOUND, flash),
            Self::Flash(status, flash) => (status, flash),
        };
        (
            status,
            Json(ErrorPage {
                status: status.as_u16(),
                flash,
            }),
        )
            .into_response()
    }
}
