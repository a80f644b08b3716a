use axum::extract::{RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;

use fyyur_db::entities::show;
use fyyur_db::{queries, AppState};

use super::START_TIME_DISPLAY;
use crate::api::pages::HomePage;
use crate::error::AppError;
use crate::forms::{FormData, FormErrors, ShowForm};

/// One row of the show listing, with both sides of the booking resolved.
#[derive(Debug, Serialize)]
pub struct ShowListing {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ShowFormView {
    #[serde(flatten)]
    pub values: ShowForm,
    pub errors: FormErrors,
}

/// GET /shows
pub async fn list_shows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShowListing>>, AppError> {
    let shows = queries::all_shows(&state.db).await?;
    let mut listings = Vec::with_capacity(shows.len());
    for s in shows {
        let venue = queries::find_venue(&state.db, s.venue_id)
            .await?
            .ok_or_else(|| AppError::not_found("Venue"))?;
        let artist = queries::find_artist(&state.db, s.artist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Artist"))?;
        listings.push(ShowListing {
            venue_id: venue.id,
            venue_name: venue.name,
            artist_id: artist.id,
            artist_name: artist.name,
            artist_image_link: artist.image_link,
            start_time: s.start_time.format(START_TIME_DISPLAY).to_string(),
        });
    }
    Ok(Json(listings))
}

/// GET /shows/create — empty form
pub async fn create_show_form() -> Json<ShowFormView> {
    Json(ShowFormView {
        values: ShowForm::default(),
        errors: FormErrors::default(),
    })
}

/// POST /shows/create
///
/// A dangling artist or venue id passes form validation and is caught by the
/// foreign keys at commit time, surfacing as a persistence failure.
pub async fn create_show_submission(
    State(state): State<Arc<AppState>>,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let form = FormData::parse(&body);
    let values = ShowForm::from_form(&form);
    let new_show = match values.validate() {
        Ok(parsed) => parsed,
        Err(errors) => {
            tracing::info!("show form rejected: {}", errors.summary());
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ShowFormView { values, errors }),
            )
                .into_response());
        }
    };

    const LISTING_FAILED: &str = "An error occurred. Show could not be listed.";

    let active = show::ActiveModel {
        start_time: Set(new_show.start_time),
        artist_id: Set(new_show.artist_id),
        venue_id: Set(new_show.venue_id),
        ..Default::default()
    };

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::db(e, LISTING_FAILED))?;
    if let Err(e) = active.insert(&txn).await {
        txn.rollback().await.ok();
        return Err(AppError::db(e, LISTING_FAILED));
    }
    txn.commit()
        .await
        .map_err(|e| AppError::db(e, LISTING_FAILED))?;

    Ok(Json(HomePage::with_flash("Show was successfully listed!".to_string())).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_listing_serialization() {
        let listing = ShowListing {
            venue_id: 1,
            venue_name: "The Musical Hop".into(),
            artist_id: 4,
            artist_name: "Guns N Petals".into(),
            artist_image_link: Some("https://images.example.com/gnp.jpg".into()),
            start_time: "2019-05-21 21:30:00".into(),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["venue_name"], "The Musical Hop");
        assert_eq!(json["artist_name"], "Guns N Petals");
        assert_eq!(json["start_time"], "2019-05-21 21:30:00");
    }

    #[test]
    fn test_show_form_view_flattens_values() {
        let view = ShowFormView {
            values: ShowForm {
                artist_id: "4".into(),
                venue_id: "1".into(),
                start_time: "2035-04-01 20:00:00".into(),
            },
            errors: FormErrors::default(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["artist_id"], "4");
        assert!(json["errors"].as_object().unwrap().is_empty());
    }
}
