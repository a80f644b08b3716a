use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use fyyur_db::AppState;

pub mod api;
pub mod error;
pub mod forms;

/// Build the full route surface against a shared application state.
///
/// Kept separate from `main` so integration tests can mount the router
/// against a mock database connection.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::pages::index))
        .route("/venues", get(api::venues::list_venues))
        .route("/venues/search", post(api::venues::search_venues))
        .route(
            "/venues/create",
            get(api::venues::create_venue_form).post(api::venues::create_venue_submission),
        )
        .route(
            "/venues/{venue_id}",
            get(api::venues::show_venue).delete(api::venues::delete_venue),
        )
        .route(
            "/venues/{venue_id}/edit",
            get(api::venues::edit_venue_form).post(api::venues::edit_venue_submission),
        )
        .route("/artists", get(api::artists::list_artists))
        .route("/artists/search", post(api::artists::search_artists))
        .route(
            "/artists/create",
            get(api::artists::create_artist_form).post(api::artists::create_artist_submission),
        )
        .route("/artists/{artist_id}", get(api::artists::show_artist))
        .route(
            "/artists/{artist_id}/edit",
            get(api::artists::edit_artist_form).post(api::artists::edit_artist_submission),
        )
        .route("/shows", get(api::shows::list_shows))
        .route(
            "/shows/create",
            get(api::shows::create_show_form).post(api::shows::create_show_submission),
        )
        .fallback(api::pages::not_found)
        .with_state(state)
}
