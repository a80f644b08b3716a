use axum::extract::{RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Local;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;

use fyyur_db::entities::{show, venue};
use fyyur_db::{genres, queries, AppState};

use super::{see_other, RecordId, SearchHit, SearchResults, START_TIME_DISPLAY};
use crate::error::AppError;
use crate::forms::{FormData, FormErrors, VenueForm, GENRE_CHOICES, STATE_CODES};
use crate::api::pages::HomePage;

#[derive(Debug, Serialize)]
pub struct VenueListing {
    pub id: i32,
    pub name: String,
}

/// One `(city, state)` group in the venue directory.
#[derive(Debug, Serialize)]
pub struct VenueArea {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueListing>,
}

/// A show on a venue's page, with the booked artist resolved.
#[derive(Debug, Serialize)]
pub struct VenueShowView {
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct VenuePage {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<VenueShowView>,
    pub upcoming_shows: Vec<VenueShowView>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct VenueFormView {
    #[serde(flatten)]
    pub values: VenueForm,
    pub errors: FormErrors,
    pub state_choices: Vec<&'static str>,
    pub genre_choices: Vec<&'static str>,
}

impl VenueFormView {
    pub fn new(values: VenueForm, errors: FormErrors) -> Self {
        Self {
            values,
            errors,
            state_choices: STATE_CODES.to_vec(),
            genre_choices: GENRE_CHOICES.to_vec(),
        }
    }
}

/// GET /venues — directory grouped by distinct (city, state)
pub async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VenueArea>>, AppError> {
    let mut areas = Vec::new();
    for (city, st) in queries::venue_locations(&state.db).await? {
        let venues = queries::venues_in(&state.db, &city, &st).await?;
        areas.push(VenueArea {
            city,
            state: st,
            venues: venues
                .into_iter()
                .map(|v| VenueListing {
                    id: v.id,
                    name: v.name,
                })
                .collect(),
        });
    }
    Ok(Json(areas))
}

/// POST /venues/search — form field `search_term`
///
/// The term is lowercased before matching and echoed back lowered.
pub async fn search_venues(
    State(state): State<Arc<AppState>>,
    RawForm(body): RawForm,
) -> Result<Json<SearchResults>, AppError> {
    let form = FormData::parse(&body);
    let search_term = form.get("search_term").unwrap_or_default().to_lowercase();

    let matches = queries::search_venues(&state.db, &search_term).await?;
    let mut data = Vec::with_capacity(matches.len());
    for v in &matches {
        let count = queries::show_count_for_venue(&state.db, v.id).await?;
        data.push(SearchHit {
            id: v.id,
            name: v.name.clone(),
            num_upcoming_shows: count,
        });
    }

    Ok(Json(SearchResults {
        count: matches.len(),
        search_term,
        data,
    }))
}

/// GET /venues/:id — detail page with past/upcoming shows
pub async fn show_venue(
    State(state): State<Arc<AppState>>,
    RecordId(venue_id): RecordId,
) -> Result<Json<VenuePage>, AppError> {
    let venue = queries::find_venue(&state.db, venue_id)
        .await?
        .ok_or_else(|| AppError::not_found("Venue"))?;

    let shows = queries::shows_for_venue(&state.db, venue_id).await?;
    let today = Local::now().date_naive();
    let (past, upcoming) = queries::partition_by_date(shows, today);

    let past_shows = resolve_artists(&state, past).await?;
    let upcoming_shows = resolve_artists(&state, upcoming).await?;

    Ok(Json(VenuePage {
        id: venue.id,
        name: venue.name,
        genres: genres::split(&venue.genres),
        address: venue.address,
        city: venue.city,
        state: venue.state,
        phone: venue.phone,
        website: venue.website_link,
        facebook_link: venue.facebook_link,
        seeking_talent: venue.seeking_talent,
        seeking_description: venue.seeking_description,
        image_link: venue.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

async fn resolve_artists(
    state: &AppState,
    shows: Vec<show::Model>,
) -> Result<Vec<VenueShowView>, AppError> {
    let mut views = Vec::with_capacity(shows.len());
    for s in shows {
        let artist = queries::find_artist(&state.db, s.artist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Artist"))?;
        views.push(VenueShowView {
            artist_id: artist.id,
            artist_name: artist.name,
            artist_image_link: artist.image_link,
            start_time: s.start_time.format(START_TIME_DISPLAY).to_string(),
        });
    }
    Ok(views)
}

/// GET /venues/create — empty form
pub async fn create_venue_form() -> Json<VenueFormView> {
    Json(VenueFormView::new(VenueForm::default(), FormErrors::default()))
}

/// POST /venues/create
pub async fn create_venue_submission(
    State(state): State<Arc<AppState>>,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let form = FormData::parse(&body);
    let (values, errors) = VenueForm::from_form(&form);
    if !errors.is_empty() {
        tracing::info!("venue form rejected: {}", errors.summary());
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(VenueFormView::new(values, errors)),
        )
            .into_response());
    }

    let name = values.name.clone();
    let listing_failed = || format!("An error occurred. Venue {name} could not be listed.");

    let new_venue = venue::ActiveModel {
        name: Set(values.name),
        city: Set(values.city),
        state: Set(values.state),
        address: Set(values.address),
        phone: Set(values.phone),
        genres: Set(genres::join(&values.genres)),
        image_link: Set(values.image_link),
        facebook_link: Set(values.facebook_link),
        website_link: Set(values.website_link),
        seeking_talent: Set(values.seeking_talent),
        seeking_description: Set(values.seeking_description),
        ..Default::default()
    };

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::db(e, listing_failed()))?;
    if let Err(e) = new_venue.insert(&txn).await {
        txn.rollback().await.ok();
        return Err(AppError::db(e, listing_failed()));
    }
    txn.commit()
        .await
        .map_err(|e| AppError::db(e, listing_failed()))?;

    let flash = format!("Venue {name} was successfully listed!");
    Ok(Json(HomePage::with_flash(flash)).into_response())
}

/// GET /venues/:id/edit — form pre-populated from the row
pub async fn edit_venue_form(
    State(state): State<Arc<AppState>>,
    RecordId(venue_id): RecordId,
) -> Result<Json<VenueFormView>, AppError> {
    let venue = queries::find_venue(&state.db, venue_id)
        .await?
        .ok_or_else(|| AppError::not_found("Venue"))?;
    Ok(Json(VenueFormView::new(
        VenueForm::from_model(venue),
        FormErrors::default(),
    )))
}

/// POST /venues/:id/edit — full overwrite of every mutable field
pub async fn edit_venue_submission(
    State(state): State<Arc<AppState>>,
    RecordId(venue_id): RecordId,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let form = FormData::parse(&body);
    let (values, errors) = VenueForm::from_form(&form);
    if !errors.is_empty() {
        // Back to the edit form; the submitted values are not carried over.
        tracing::info!("venue edit rejected: {}", errors.summary());
        return Ok(Redirect::to(&format!("/venues/{venue_id}/edit")).into_response());
    }

    let venue = queries::find_venue(&state.db, venue_id)
        .await?
        .ok_or_else(|| AppError::not_found("Venue"))?;

    let name = values.name.clone();
    let update_failed = || format!("An error occurred. Venue {name} could not be updated.");

    let mut active: venue::ActiveModel = venue.into();
    active.name = Set(values.name);
    active.city = Set(values.city);
    active.state = Set(values.state);
    active.address = Set(values.address);
    active.phone = Set(values.phone);
    active.genres = Set(genres::join(&values.genres));
    active.image_link = Set(values.image_link);
    active.facebook_link = Set(values.facebook_link);
    active.website_link = Set(values.website_link);
    active.seeking_talent = Set(values.seeking_talent);
    active.seeking_description = Set(values.seeking_description);

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::db(e, update_failed()))?;
    if let Err(e) = active.update(&txn).await {
        txn.rollback().await.ok();
        return Err(AppError::db(e, update_failed()));
    }
    txn.commit()
        .await
        .map_err(|e| AppError::db(e, update_failed()))?;

    let flash = format!("Venue {name} was updated successfully!");
    Ok(see_other(format!("/venues/{venue_id}"), flash))
}

/// DELETE /venues/:id — never wired into the UI; rejects without touching
/// the row.
pub async fn delete_venue(RecordId(venue_id): RecordId) -> AppError {
    tracing::warn!(venue_id, "venue delete requested but not supported");
    AppError::Flash(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An error occurred. Venue could not be deleted.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_venue_model() -> venue::Model {
        venue::Model {
            id: 1,
            name: "The Musical Hop".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            phone: Some("123-123-1234".into()),
            genres: "Jazz,Reggae,Swing,Classical,Folk".into(),
            image_link: Some("https://images.example.com/hop.jpg".into()),
            facebook_link: Some("https://www.facebook.com/TheMusicalHop".into()),
            website_link: Some("https://www.themusicalhop.com".into()),
            seeking_talent: true,
            seeking_description: Some("Looking for a local artist.".into()),
        }
    }

    #[test]
    fn test_venue_area_serialization() {
        let area = VenueArea {
            city: "San Francisco".into(),
            state: "CA".into(),
            venues: vec![VenueListing {
                id: 1,
                name: "The Musical Hop".into(),
            }],
        };
        let json = serde_json::to_value(&area).unwrap();
        assert_eq!(json["city"], "San Francisco");
        assert_eq!(json["venues"][0]["name"], "The Musical Hop");
    }

    #[test]
    fn test_form_view_from_model_splits_genres() {
        let view = VenueFormView::new(
            VenueForm::from_model(make_venue_model()),
            FormErrors::default(),
        );
        assert_eq!(
            view.values.genres,
            vec!["Jazz", "Reggae", "Swing", "Classical", "Folk"]
        );
        let json = serde_json::to_value(&view).unwrap();
        // Flattened values sit beside the choice lists.
        assert_eq!(json["name"], "The Musical Hop");
        assert!(json["state_choices"].as_array().unwrap().len() > 50);
        assert!(json["errors"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_venue_page_counts_match_sets() {
        let page = VenuePage {
            id: 1,
            name: "The Musical Hop".into(),
            genres: vec!["Jazz".into()],
            address: "1015 Folsom Street".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            phone: None,
            website: None,
            facebook_link: None,
            seeking_talent: false,
            seeking_description: None,
            image_link: None,
            past_shows: vec![VenueShowView {
                artist_id: 4,
                artist_name: "Guns N Petals".into(),
                artist_image_link: None,
                start_time: "2019-05-21 21:30:00".into(),
            }],
            upcoming_shows: vec![],
            past_shows_count: 1,
            upcoming_shows_count: 0,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["past_shows"].as_array().unwrap().len(), 1);
        assert_eq!(json["past_shows_count"], 1);
        assert_eq!(json["upcoming_shows_count"], 0);
        assert_eq!(json["website"], serde_json::Value::Null);
    }
}
