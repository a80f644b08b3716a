pub mod artists;
pub mod pages;
pub mod shows;
pub mod venues;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::AppError;

/// Display format for a show's start time, matching the stored form.
pub const START_TIME_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// Numeric row id taken from the request path. A non-numeric id is treated
/// the same as an unknown route and renders the 404 page, not a bare
/// extractor rejection.
pub struct RecordId(pub i32);

impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = || AppError::NotFound("Not Found".to_string());
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;
        raw.parse().map(Self).map_err(|_| not_found())
    }
}

/// A flash notification attached to a rendered page or redirect.
#[derive(Debug, Serialize)]
pub struct Flash {
    pub flash: String,
}

/// One search hit. `num_upcoming_shows` is the total booking count for the
/// entity, not filtered by date.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub search_term: String,
    pub data: Vec<SearchHit>,
}

/// 303 redirect carrying its flash message in the body.
pub(crate) fn see_other(location: String, flash: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location)],
        Json(Flash { flash }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_results_serialization() {
        let results = SearchResults {
            count: 1,
            search_term: "hop".into(),
            data: vec![SearchHit {
                id: 1,
                name: "The Musical Hop".into(),
                num_upcoming_shows: 3,
            }],
        };
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["name"], "The Musical Hop");
        assert_eq!(json["data"][0]["num_upcoming_shows"], 3);
    }

    #[test]
    fn test_see_other_sets_location() {
        let response = see_other("/venues/7".into(), "updated".into());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/venues/7"
        );
    }
}
