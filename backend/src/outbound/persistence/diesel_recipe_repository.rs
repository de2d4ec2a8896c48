//! PostgreSQL-backed `RecipeRepository` implementation using Diesel ORM.
//!
//! Read-modify-write operations lock the row with `SELECT … FOR UPDATE`,
//! apply the domain mutation, and write the whole record back inside one
//! transaction. The mutation rules therefore match the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{RecipePersistenceError, RecipeRepository};
use crate::domain::{Recipe, RecipeDraft, RecipeId, normalize_tags};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, contains_pattern, map_pool_error_message,
};
use super::models::{RecipeRecord, RecipeRow, TagRow};
use super::pool::{DbPool, PoolError};
use super::schema::recipes;

const SEARCH_SQL: &str = r#"
SELECT id, name, num_ingredients, ingredients, directions, prep_time, cook_time,
       servings, tags, notes, rating, favorite, when_made, deleted, images,
       created_date, last_modified_date
FROM recipes
WHERE NOT deleted AND search_vector @@ plainto_tsquery('english', $1)
ORDER BY ts_rank(search_vector, plainto_tsquery('english', $1)) DESC, created_date
"#;

const TAGS_SQL: &str = r#"
SELECT DISTINCT unnest(tags) AS tag
FROM recipes
WHERE NOT deleted
ORDER BY tag
"#;

/// Diesel-backed implementation of the `RecipeRepository` port.
#[derive(Clone)]
pub struct DieselRecipeRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselRecipeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn list(
        &self,
        deleted: Option<bool>,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = recipes::table
            .select(RecipeRow::as_select())
            .order(recipes::created_date.asc())
            .into_boxed();
        if let Some(deleted) = deleted {
            query = query.filter(recipes::deleted.eq(deleted));
        }
        let rows: Vec<RecipeRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list recipes"))?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    /// Lock the row, apply `mutate`, and persist the result. The flag reports
    /// whether `mutate` changed the recipe; `None` means it does not exist.
    async fn update<F>(
        &self,
        id: &RecipeId,
        operation: &'static str,
        mutate: F,
    ) -> Result<Option<(bool, Recipe)>, RecipePersistenceError>
    where
        F: FnOnce(&mut Recipe, DateTime<Utc>) -> bool + Send,
    {
        let now = self.clock.utc();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(row) = recipes::table
                    .find(id)
                    .select(RecipeRow::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };
                let mut recipe = Recipe::from(row);
                let changed = mutate(&mut recipe, now);
                // Tag calls touch the modification date even when the set is unchanged.
                diesel::update(recipes::table.find(id))
                    .set(&RecipeRecord::from(&recipe))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(Some((changed, recipe)))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, operation))
    }

    async fn count_change<F>(
        &self,
        id: &RecipeId,
        operation: &'static str,
        mutate: F,
    ) -> Result<usize, RecipePersistenceError>
    where
        F: FnOnce(&mut Recipe, DateTime<Utc>) -> bool + Send,
    {
        let outcome = self.update(id, operation, mutate).await?;
        Ok(usize::from(outcome.is_some_and(|(changed, _)| changed)))
    }
}

/// Map pool errors to domain recipe repository errors.
fn map_pool_error(error: PoolError) -> RecipePersistenceError {
    RecipePersistenceError::connection(map_pool_error_message(error))
}

/// Map Diesel errors to domain recipe repository errors.
fn map_diesel_error(error: diesel::result::Error, operation: &str) -> RecipePersistenceError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => RecipePersistenceError::connection(message),
        DieselFailure::Query(message) => RecipePersistenceError::query(message),
    }
}

#[async_trait]
impl RecipeRepository for DieselRecipeRepository {
    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, RecipePersistenceError> {
        let recipe = Recipe::from_draft(RecipeId::random(), draft.clone(), self.clock.utc());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(recipes::table)
            .values(&RecipeRecord::from(&recipe))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "create recipe"))?;
        Ok(recipe)
    }

    async fn edit(
        &self,
        id: &RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let draft = draft.clone();
        let outcome = self
            .update(id, "edit recipe", move |recipe, now| {
                recipe.apply_draft(draft, now);
                true
            })
            .await?;
        Ok(outcome.map(|(_, recipe)| recipe))
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RecipeRow> = recipes::table
            .find(id.as_uuid())
            .select(RecipeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find recipe"))?;
        Ok(row.map(Recipe::from))
    }

    async fn find_by_name(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecipeRow> = recipes::table
            .filter(recipes::deleted.eq(false))
            .filter(recipes::name.ilike(contains_pattern(text)))
            .select(RecipeRow::as_select())
            .order(recipes::created_date.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "find recipes by name"))?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn find_by_tag(&self, tags: &[String]) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let tags = normalize_tags(tags);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecipeRow> = recipes::table
            .filter(recipes::deleted.eq(false))
            .filter(recipes::tags.contains(tags))
            .select(RecipeRow::as_select())
            .order(recipes::created_date.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "find recipes by tag"))?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn search_text(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecipeRow> = sql_query(SEARCH_SQL)
            .bind::<Text, _>(text)
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "search recipes"))?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn tags(&self) -> Result<Vec<String>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TagRow> = sql_query(TAGS_SQL)
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list tags"))?;
        Ok(rows.into_iter().map(|row| row.tag).collect())
    }

    async fn all(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.list(None).await
    }

    async fn active(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.list(Some(false)).await
    }

    async fn deleted(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.list(Some(true)).await
    }

    async fn copy(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError> {
        let now = self.clock.utc();
        let source_id: Uuid = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(row) = recipes::table
                    .find(source_id)
                    .select(RecipeRow::as_select())
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };
                let source = Recipe::from(row);
                let copy = Recipe::from_draft(RecipeId::random(), source.copy_draft(), now);
                diesel::insert_into(recipes::table)
                    .values(&RecipeRecord::from(&copy))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(Some(copy))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "copy recipe"))
    }

    async fn add_tag(&self, id: &RecipeId, tag: &str) -> Result<usize, RecipePersistenceError> {
        self.count_change(id, "add tag", |recipe, now| recipe.add_tag(tag, now))
            .await
    }

    async fn delete_tag(
        &self,
        id: &RecipeId,
        tag: &str,
    ) -> Result<usize, RecipePersistenceError> {
        self.count_change(id, "delete tag", |recipe, now| recipe.remove_tag(tag, now))
            .await
    }

    async fn mark_made(
        &self,
        id: &RecipeId,
        at: DateTime<Utc>,
    ) -> Result<usize, RecipePersistenceError> {
        self.count_change(id, "mark made", move |recipe, now| recipe.mark_made(at, now))
            .await
    }

    async fn delete(&self, id: &RecipeId) -> Result<usize, RecipePersistenceError> {
        self.count_change(id, "delete recipe", |recipe, now| {
            recipe.soft_delete(now);
            true
        })
        .await
    }
}
