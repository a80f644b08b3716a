use axum::extract::{RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Local;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;

use fyyur_db::entities::{artist, show};
use fyyur_db::{genres, queries, AppState};

use super::{see_other, RecordId, SearchHit, SearchResults, START_TIME_DISPLAY};
use crate::api::pages::HomePage;
use crate::error::AppError;
use crate::forms::{ArtistForm, FormData, FormErrors, GENRE_CHOICES, STATE_CODES};

#[derive(Debug, Serialize)]
pub struct ArtistListing {
    pub id: i32,
    pub name: String,
}

/// A show on an artist's page, with the hosting venue resolved.
#[derive(Debug, Serialize)]
pub struct ArtistShowView {
    pub venue_id: i32,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ArtistPage {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ArtistShowView>,
    pub upcoming_shows: Vec<ArtistShowView>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtistFormView {
    #[serde(flatten)]
    pub values: ArtistForm,
    pub errors: FormErrors,
    pub state_choices: Vec<&'static str>,
    pub genre_choices: Vec<&'static str>,
}

impl ArtistFormView {
    pub fn new(values: ArtistForm, errors: FormErrors) -> Self {
        Self {
            values,
            errors,
            state_choices: STATE_CODES.to_vec(),
            genre_choices: GENRE_CHOICES.to_vec(),
        }
    }
}

/// GET /artists — flat listing
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtistListing>>, AppError> {
    let artists = queries::all_artists(&state.db).await?;
    Ok(Json(
        artists
            .into_iter()
            .map(|a| ArtistListing {
                id: a.id,
                name: a.name,
            })
            .collect(),
    ))
}

/// POST /artists/search — form field `search_term`
///
/// Unlike the venue search, the term is echoed back exactly as submitted.
pub async fn search_artists(
    State(state): State<Arc<AppState>>,
    RawForm(body): RawForm,
) -> Result<Json<SearchResults>, AppError> {
    let form = FormData::parse(&body);
    let search_term = form.get("search_term").unwrap_or_default().to_string();

    let matches = queries::search_artists(&state.db, &search_term).await?;
    let mut data = Vec::with_capacity(matches.len());
    for a in &matches {
        let count = queries::show_count_for_artist(&state.db, a.id).await?;
        data.push(SearchHit {
            id: a.id,
            name: a.name.clone(),
            num_upcoming_shows: count,
        });
    }

    Ok(Json(SearchResults {
        count: matches.len(),
        search_term,
        data,
    }))
}

/// GET /artists/:id — detail page with past/upcoming shows
pub async fn show_artist(
    State(state): State<Arc<AppState>>,
    RecordId(artist_id): RecordId,
) -> Result<Json<ArtistPage>, AppError> {
    let artist = queries::find_artist(&state.db, artist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist"))?;

    let shows = queries::shows_for_artist(&state.db, artist_id).await?;
    let today = Local::now().date_naive();
    let (past, upcoming) = queries::partition_by_date(shows, today);

    let past_shows = resolve_venues(&state, past).await?;
    let upcoming_shows = resolve_venues(&state, upcoming).await?;

    Ok(Json(ArtistPage {
        id: artist.id,
        name: artist.name,
        genres: genres::split(&artist.genres),
        city: artist.city,
        state: artist.state,
        phone: artist.phone,
        website: artist.website_link,
        facebook_link: artist.facebook_link,
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description,
        image_link: artist.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

async fn resolve_venues(
    state: &AppState,
    shows: Vec<show::Model>,
) -> Result<Vec<ArtistShowView>, AppError> {
    let mut views = Vec::with_capacity(shows.len());
    for s in shows {
        let venue = queries::find_venue(&state.db, s.venue_id)
            .await?
            .ok_or_else(|| AppError::not_found("Venue"))?;
        views.push(ArtistShowView {
            venue_id: venue.id,
            venue_name: venue.name,
            venue_image_link: venue.image_link,
            start_time: s.start_time.format(START_TIME_DISPLAY).to_string(),
        });
    }
    Ok(views)
}

/// GET /artists/create — empty form
pub async fn create_artist_form() -> Json<ArtistFormView> {
    Json(ArtistFormView::new(
        ArtistForm::default(),
        FormErrors::default(),
    ))
}

/// POST /artists/create
pub async fn create_artist_submission(
    State(state): State<Arc<AppState>>,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let form = FormData::parse(&body);
    let (values, errors) = ArtistForm::from_form(&form);
    if !errors.is_empty() {
        tracing::info!("artist form rejected: {}", errors.summary());
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ArtistFormView::new(values, errors)),
        )
            .into_response());
    }

    let name = values.name.clone();
    let listing_failed = || format!("An error occurred. Artist {name} could not be listed.");

    let new_artist = artist::ActiveModel {
        name: Set(values.name),
        city: Set(values.city),
        state: Set(values.state),
        phone: Set(values.phone),
        genres: Set(genres::join(&values.genres)),
        image_link: Set(values.image_link),
        facebook_link: Set(values.facebook_link),
        website_link: Set(values.website_link),
        seeking_venue: Set(values.seeking_venue),
        seeking_description: Set(values.seeking_description),
        ..Default::default()
    };

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::db(e, listing_failed()))?;
    if let Err(e) = new_artist.insert(&txn).await {
        txn.rollback().await.ok();
        return Err(AppError::db(e, listing_failed()));
    }
    txn.commit()
        .await
        .map_err(|e| AppError::db(e, listing_failed()))?;

    let flash = format!("Artist {name} was successfully listed!");
    Ok(Json(HomePage::with_flash(flash)).into_response())
}

/// GET /artists/:id/edit — form pre-populated from the row
pub async fn edit_artist_form(
    State(state): State<Arc<AppState>>,
    RecordId(artist_id): RecordId,
) -> Result<Json<ArtistFormView>, AppError> {
    let artist = queries::find_artist(&state.db, artist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist"))?;
    Ok(Json(ArtistFormView::new(
        ArtistForm::from_model(artist),
        FormErrors::default(),
    )))
}

/// POST /artists/:id/edit — full overwrite of every mutable field
pub async fn edit_artist_submission(
    State(state): State<Arc<AppState>>,
    RecordId(artist_id): RecordId,
    RawForm(body): RawForm,
) -> Result<Response, AppError> {
    let form = FormData::parse(&body);
    let (values, errors) = ArtistForm::from_form(&form);
    if !errors.is_empty() {
        // Back to the edit form; the submitted values are not carried over.
        tracing::info!("artist edit rejected: {}", errors.summary());
        return Ok(Redirect::to(&format!("/artists/{artist_id}/edit")).into_response());
    }

    let artist = queries::find_artist(&state.db, artist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist"))?;

    let name = values.name.clone();
    let update_failed = || format!("An error occurred. Artist {name} could not be updated.");

    let mut active: artist::ActiveModel = artist.into();
    active.name = Set(values.name);
    active.city = Set(values.city);
    active.state = Set(values.state);
    active.phone = Set(values.phone);
    active.genres = Set(genres::join(&values.genres));
    active.image_link = Set(values.image_link);
    active.facebook_link = Set(values.facebook_link);
    active.website_link = Set(values.website_link);
    active.seeking_venue = Set(values.seeking_venue);
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

    let flash = format!("Artist {name} was updated successfully!");
    Ok(see_other(format!("/artists/{artist_id}"), flash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_artist_model() -> artist::Model {
        artist::Model {
            id: 4,
            name: "Guns N Petals".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            phone: Some("326-123-5000".into()),
            genres: "Rock n Roll".into(),
            image_link: Some("https://images.example.com/gnp.jpg".into()),
            facebook_link: Some("https://www.facebook.com/GunsNPetals".into()),
            website_link: Some("https://www.gunsnpetalsband.com".into()),
            seeking_venue: true,
            seeking_description: Some("Looking for shows in the Bay Area!".into()),
        }
    }

    #[test]
    fn test_artist_listing_serialization() {
        let listing = ArtistListing {
            id: 4,
            name: "Guns N Petals".into(),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["name"], "Guns N Petals");
    }

    #[test]
    fn test_form_view_from_model() {
        let view = ArtistFormView::new(
            ArtistForm::from_model(make_artist_model()),
            FormErrors::default(),
        );
        assert_eq!(view.values.genres, vec!["Rock n Roll"]);
        assert!(view.values.seeking_venue);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Guns N Petals");
        assert!(json["genre_choices"]
            .as_array()
            .unwrap()
            .iter()
            .any(|g| g == "Rock n Roll"));
    }

    #[test]
    fn test_artist_page_show_view_serialization() {
        let view = ArtistShowView {
            venue_id: 1,
            venue_name: "The Musical Hop".into(),
            venue_image_link: None,
            start_time: "2019-05-21 21:30:00".into(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["venue_name"], "The Musical Hop");
        assert_eq!(json["start_time"], "2019-05-21 21:30:00");
    }
}
