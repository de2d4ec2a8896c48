//! Port abstraction for recipe persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Recipe, RecipeDraft, RecipeId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by recipe repository adapters.
    pub enum RecipePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "recipe repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "recipe repository query failed: {message}",
    }
}

/// Storage contract for recipes.
///
/// Lookups that miss return `None` or an empty list. Counting mutations
/// return `1` when stored state changed and `0` otherwise, including when the
/// recipe does not exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Insert a recipe built from `draft`.
    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, RecipePersistenceError>;

    /// Overwrite the editable fields of an existing recipe.
    async fn edit(
        &self,
        id: &RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Fetch a recipe by identifier, deleted or not.
    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Non-deleted recipes whose name contains `text`, ignoring case.
    async fn find_by_name(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Non-deleted recipes carrying every tag in `tags`.
    async fn find_by_tag(&self, tags: &[String]) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Weighted full-text search over non-deleted recipes.
    async fn search_text(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Distinct tags used by non-deleted recipes, sorted.
    async fn tags(&self) -> Result<Vec<String>, RecipePersistenceError>;

    /// Every recipe.
    async fn all(&self) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Recipes that are not soft-deleted.
    async fn active(&self) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Soft-deleted recipes.
    async fn deleted(&self) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Store a copy of the recipe under a new identity.
    async fn copy(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Add a tag to the recipe's tag set.
    async fn add_tag(&self, id: &RecipeId, tag: &str) -> Result<usize, RecipePersistenceError>;

    /// Remove a tag from the recipe's tag set.
    async fn delete_tag(&self, id: &RecipeId, tag: &str)
    -> Result<usize, RecipePersistenceError>;

    /// Record a "made" date unless one exists for the same UTC day.
    async fn mark_made(
        &self,
        id: &RecipeId,
        at: DateTime<Utc>,
    ) -> Result<usize, RecipePersistenceError>;

    /// Soft-delete the recipe.
    async fn delete(&self, id: &RecipeId) -> Result<usize, RecipePersistenceError>;
}
