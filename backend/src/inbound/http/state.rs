//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the use cases and remain testable without I/O.

use crate::domain::{AccountService, RecipeService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub recipes: RecipeService,
}

impl HttpState {
    /// Bundle the account and recipe use cases.
    ///
    /// # Examples
    /// ```no_run
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use mockable::DefaultClock;
    /// use recipebox::domain::security::HashStrength;
    /// use recipebox::domain::{AccountService, RecipeFilePaths, RecipeService};
    /// use recipebox::inbound::http::state::HttpState;
    /// use recipebox::outbound::export::PdfRecipeExporter;
    /// use recipebox::outbound::images::ThumbnailImporter;
    /// use recipebox::outbound::memory::{InMemoryRecipeRepository, InMemoryUserRepository};
    /// use recipebox::outbound::scraper::HttpRecipeScraper;
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let accounts = AccountService::new(
    ///     Arc::new(InMemoryUserRepository::new(clock.clone())),
    ///     HashStrength::Standard,
    /// );
    /// let recipes = RecipeService::new(
    ///     Arc::new(InMemoryRecipeRepository::new(clock.clone())),
    ///     Arc::new(ThumbnailImporter::new("files/images", ["png"])),
    ///     Arc::new(PdfRecipeExporter::new()),
    ///     Arc::new(HttpRecipeScraper::new(Duration::from_secs(10)).expect("client")),
    ///     clock,
    ///     RecipeFilePaths {
    ///         image_dir: PathBuf::from("files/images"),
    ///         export_dir: PathBuf::from("files/exports"),
    ///     },
    /// );
    /// let state = HttpState::new(accounts, recipes);
    /// let _accounts = state.accounts.clone();
    /// ```
    pub fn new(accounts: AccountService, recipes: RecipeService) -> Self {
        Self { accounts, recipes }
    }
}
