//! Applies the embedded Diesel migrations at start-up.

use async_trait::async_trait;
use diesel::Connection as _;
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::{DbInitError, DbInitializer};

/// Migrations compiled into the binary from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations over a dedicated connection.
///
/// Diesel's migration harness is synchronous, so the work runs on the
/// blocking pool through [`AsyncConnectionWrapper`].
#[derive(Debug, Clone)]
pub struct DieselDbInitializer {
    database_url: String,
}

impl DieselDbInitializer {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl DbInitializer for DieselDbInitializer {
    async fn initialize(&self) -> Result<(), DbInitError> {
        let database_url = self.database_url.clone();
        let applied = tokio::task::spawn_blocking(move || {
            let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)
                .map_err(|err| DbInitError::connection(err.to_string()))?;
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|err| DbInitError::migration(err.to_string()))
        })
        .await
        .map_err(|err| DbInitError::migration(format!("migration task failed: {err}")))??;
        info!(applied, "database migrations applied");
        Ok(())
    }
}
