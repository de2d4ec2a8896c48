//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven adapters (databases, the filesystem, remote sites) implement these
//! traits. Each exposes a typed error so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod db_initializer;
mod image_processor;
mod recipe_exporter;
mod recipe_repository;
mod recipe_scraper;
mod user_repository;

#[cfg(test)]
pub use db_initializer::MockDbInitializer;
pub use db_initializer::{DbInitError, DbInitializer, NoOpDbInitializer};
#[cfg(test)]
pub use image_processor::MockImageProcessor;
pub use image_processor::{ImageProcessingError, ImageProcessor};
#[cfg(test)]
pub use recipe_exporter::MockRecipeExporter;
pub use recipe_exporter::{RecipeExportError, RecipeExporter};
#[cfg(test)]
pub use recipe_repository::MockRecipeRepository;
pub use recipe_repository::{RecipePersistenceError, RecipeRepository};
#[cfg(test)]
pub use recipe_scraper::MockRecipeScraper;
pub use recipe_scraper::{RecipeScrapeError, RecipeScraper, ScrapedRecipe};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
