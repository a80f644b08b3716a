use axum::Json;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub flash: Option<String>,
}

impl HomePage {
    pub fn with_flash(flash: String) -> Self {
        Self { flash: Some(flash) }
    }
}

/// GET /
pub async fn index() -> Json<HomePage> {
    Json(HomePage { flash: None })
}

/// Fallback for every unknown route.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
