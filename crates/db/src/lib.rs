//! Postgres plumbing for the books service: connection pool factory, the
//! ordered schema bootstrap and classification of driver errors.

pub mod error;
pub mod migrate;

pub use error::DbError;
pub use migrate::migrate;

use std::time::Duration;

use anyhow::Context;
use books_kernel::settings::DatabaseSettings;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Open a connection pool and verify the database is reachable.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "books-db",
        max_connections = settings.max_connections,
        "connecting to postgres"
    );

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.url)
        .await
        .with_context(|| "failed to connect to postgres")
}
