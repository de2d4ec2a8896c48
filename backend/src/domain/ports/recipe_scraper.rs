//! Port for pulling structured recipes from third-party web pages.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures raised while scraping a recipe page.
    pub enum RecipeScrapeError {
        /// The page or image could not be fetched.
        Fetch { message: String } => "recipe page could not be fetched: {message}",
        /// The page carried no usable recipe data.
        Parse { message: String } => "recipe page could not be parsed: {message}",
        /// A downloaded file could not be written.
        Io { message: String } => "downloaded file could not be stored: {message}",
    }
}

/// Recipe fields as published by the source page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedRecipe {
    pub title: String,
    /// Total time in minutes.
    pub total_time: Option<f64>,
    pub yields: Option<String>,
    pub ingredients: Vec<String>,
    /// Instructions joined with newlines.
    pub instructions: String,
    pub image: Option<String>,
    pub nutrients: BTreeMap<String, String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeScraper: Send + Sync {
    /// Fetch `url` and extract its recipe.
    async fn scrape(&self, url: &str) -> Result<ScrapedRecipe, RecipeScrapeError>;

    /// Download `url` into `dir`, returning the written path.
    async fn download_image(&self, url: &str, dir: &Path) -> Result<PathBuf, RecipeScrapeError>;
}
