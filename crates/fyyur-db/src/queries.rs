//! Repository-style query functions over the Fyyur schema.
//!
//! Handlers go through these instead of navigating lazy relation attributes;
//! every function takes the connection explicitly and returns plain models.

use chrono::NaiveDate;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{artist, show, venue};

/// Escape SQL LIKE wildcards in a user-supplied search term.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Distinct `(city, state)` pairs across all venues.
pub async fn venue_locations(db: &DatabaseConnection) -> Result<Vec<(String, String)>, DbErr> {
    venue::Entity::find()
        .select_only()
        .column(venue::Column::City)
        .column(venue::Column::State)
        .group_by(venue::Column::City)
        .group_by(venue::Column::State)
        .into_tuple()
        .all(db)
        .await
}

/// All venues in one `(city, state)` location.
pub async fn venues_in(
    db: &DatabaseConnection,
    city: &str,
    state: &str,
) -> Result<Vec<venue::Model>, DbErr> {
    venue::Entity::find()
        .filter(venue::Column::City.eq(city))
        .filter(venue::Column::State.eq(state))
        .order_by_asc(venue::Column::Name)
        .all(db)
        .await
}

pub async fn find_venue(db: &DatabaseConnection, id: i32) -> Result<Option<venue::Model>, DbErr> {
    venue::Entity::find_by_id(id).one(db).await
}

pub async fn find_artist(db: &DatabaseConnection, id: i32) -> Result<Option<artist::Model>, DbErr> {
    artist::Entity::find_by_id(id).one(db).await
}

pub async fn all_artists(db: &DatabaseConnection) -> Result<Vec<artist::Model>, DbErr> {
    artist::Entity::find()
        .order_by_asc(artist::Column::Id)
        .all(db)
        .await
}

pub async fn all_shows(db: &DatabaseConnection) -> Result<Vec<show::Model>, DbErr> {
    show::Entity::find()
        .order_by_asc(show::Column::StartTime)
        .all(db)
        .await
}

/// Case-insensitive substring match on venue name only.
pub async fn search_venues(
    db: &DatabaseConnection,
    term: &str,
) -> Result<Vec<venue::Model>, DbErr> {
    let pattern = format!("%{}%", escape_like(term));
    venue::Entity::find()
        .filter(Expr::col(venue::Column::Name).ilike(pattern))
        .order_by_asc(venue::Column::Name)
        .all(db)
        .await
}

/// Case-insensitive substring match on artist name only.
pub async fn search_artists(
    db: &DatabaseConnection,
    term: &str,
) -> Result<Vec<artist::Model>, DbErr> {
    let pattern = format!("%{}%", escape_like(term));
    artist::Entity::find()
        .filter(Expr::col(artist::Column::Name).ilike(pattern))
        .order_by_asc(artist::Column::Name)
        .all(db)
        .await
}

pub async fn shows_for_venue(
    db: &DatabaseConnection,
    venue_id: i32,
) -> Result<Vec<show::Model>, DbErr> {
    show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .order_by_asc(show::Column::StartTime)
        .all(db)
        .await
}

pub async fn shows_for_artist(
    db: &DatabaseConnection,
    artist_id: i32,
) -> Result<Vec<show::Model>, DbErr> {
    show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .order_by_asc(show::Column::StartTime)
        .all(db)
        .await
}

/// Total bookings for a venue, not filtered by date.
pub async fn show_count_for_venue(db: &DatabaseConnection, venue_id: i32) -> Result<u64, DbErr> {
    show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .count(db)
        .await
}

/// Total bookings for an artist, not filtered by date.
pub async fn show_count_for_artist(db: &DatabaseConnection, artist_id: i32) -> Result<u64, DbErr> {
    show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .count(db)
        .await
}

/// Split a profile's shows into past and upcoming at day granularity.
///
/// A show is past when its start date is strictly before `today`; everything
/// else, including shows starting later today, counts as upcoming. Every show
/// lands in exactly one of the two sets.
pub fn partition_by_date(
    shows: Vec<show::Model>,
    today: NaiveDate,
) -> (Vec<show::Model>, Vec<show::Model>) {
    shows
        .into_iter()
        .partition(|s| s.start_time.date() < today)
}
