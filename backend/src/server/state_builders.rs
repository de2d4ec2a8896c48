//! Builders for the HTTP handler state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use recipebox::domain::ports::{RecipeRepository, UserRepository};
use recipebox::domain::{AccountService, RecipeFilePaths, RecipeService};
use recipebox::inbound::http::state::HttpState;
use recipebox::outbound::export::PdfRecipeExporter;
use recipebox::outbound::images::ThumbnailImporter;
use recipebox::outbound::memory::{InMemoryRecipeRepository, InMemoryUserRepository};
use recipebox::outbound::persistence::{DbPool, DieselRecipeRepository, DieselUserRepository};
use recipebox::outbound::scraper::HttpRecipeScraper;

use super::ServerConfig;

/// Time allowed for fetching a recipe page or its image.
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

/// Select PostgreSQL repositories when a pool is configured, in-memory ones otherwise.
fn build_repositories(
    pool: Option<&DbPool>,
    clock: &Arc<dyn Clock>,
) -> (Arc<dyn RecipeRepository>, Arc<dyn UserRepository>) {
    match pool {
        Some(pool) => (
            Arc::new(DieselRecipeRepository::new(pool.clone(), clock.clone())),
            Arc::new(DieselUserRepository::new(pool.clone(), clock.clone())),
        ),
        None => {
            info!("no database configured; recipes are kept in memory");
            (
                Arc::new(InMemoryRecipeRepository::new(clock.clone())),
                Arc::new(InMemoryUserRepository::new(clock.clone())),
            )
        }
    }
}

/// Wire the use cases and their adapters, creating the file directories.
///
/// # Errors
/// Returns [`std::io::Error`] when a directory cannot be created or the HTTP
/// client cannot be built.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let files = &config.files;
    std::fs::create_dir_all(&files.image_dir)?;
    std::fs::create_dir_all(&files.export_dir)?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (recipes, users) = build_repositories(config.db_pool.as_ref(), &clock);
    let scraper = HttpRecipeScraper::new(SCRAPE_TIMEOUT)
        .map_err(|err| std::io::Error::other(format!("http client: {err}")))?;

    let accounts = AccountService::new(users, config.hash_strength);
    let recipes = RecipeService::new(
        recipes,
        Arc::new(ThumbnailImporter::new(
            files.image_dir.clone(),
            files.allowed_image_extensions.iter(),
        )),
        Arc::new(PdfRecipeExporter::new()),
        Arc::new(scraper),
        clock,
        RecipeFilePaths {
            image_dir: files.image_dir.clone(),
            export_dir: files.export_dir.clone(),
        },
    );
    Ok(web::Data::new(HttpState::new(accounts, recipes)))
}
