// Shared test utilities for integration tests
use fyyur_db::AppState;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;

/// Wrap a (mock) connection in the shared application state.
pub fn state_with(db: DatabaseConnection) -> Arc<AppState> {
    Arc::new(AppState { db })
}

/// A mock connection with nothing queued: any query against it fails, so
/// routes that must not touch the database can prove they didn't.
pub fn empty_mock() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}
