//! In-process repositories used when no database is configured.
//!
//! State lives behind a [`Mutex`]; every read-modify-write runs under one
//! lock acquisition. Insertion order is preserved so listings are stable.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    RecipePersistenceError, RecipeRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{NewUser, Recipe, RecipeDraft, RecipeId, User, UserId};

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{store} store lock poisoned"))
}

/// Mutex-guarded recipe store.
pub struct InMemoryRecipeRepository {
    recipes: Mutex<Vec<Recipe>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRecipeRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            recipes: Mutex::new(Vec::new()),
            clock,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Recipe>>, RecipePersistenceError> {
        lock(&self.recipes, "recipe").map_err(RecipePersistenceError::connection)
    }

    fn select(
        &self,
        predicate: impl Fn(&Recipe) -> bool,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        Ok(self
            .guard()?
            .iter()
            .filter(|recipe| predicate(recipe))
            .cloned()
            .collect())
    }

    fn update(
        &self,
        id: &RecipeId,
        mutate: impl FnOnce(&mut Recipe, DateTime<Utc>) -> bool,
    ) -> Result<usize, RecipePersistenceError> {
        let now = self.clock.utc();
        let mut recipes = self.guard()?;
        let changed = recipes
            .iter_mut()
            .find(|recipe| recipe.id == *id)
            .is_some_and(|recipe| mutate(recipe, now));
        Ok(usize::from(changed))
    }

    fn insert(&self, draft: RecipeDraft) -> Result<Recipe, RecipePersistenceError> {
        let recipe = Recipe::from_draft(RecipeId::random(), draft, self.clock.utc());
        self.guard()?.push(recipe.clone());
        Ok(recipe)
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn create(&self, draft: &RecipeDraft) -> Result<Recipe, RecipePersistenceError> {
        self.insert(draft.clone())
    }

    async fn edit(
        &self,
        id: &RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let now = self.clock.utc();
        let mut recipes = self.guard()?;
        Ok(recipes
            .iter_mut()
            .find(|recipe| recipe.id == *id)
            .map(|recipe| {
                recipe.apply_draft(draft.clone(), now);
                recipe.clone()
            }))
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError> {
        Ok(self.guard()?.iter().find(|recipe| recipe.id == *id).cloned())
    }

    async fn find_by_name(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.select(|recipe| !recipe.deleted && recipe.name_contains(text))
    }

    async fn find_by_tag(&self, tags: &[String]) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.select(|recipe| !recipe.deleted && recipe.has_all_tags(tags))
    }

    /// Term match over name, tags, ingredients and directions, ranked with
    /// the same field priority as the database index.
    async fn search_text(&self, text: &str) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let terms: Vec<String> = text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut ranked: Vec<(u32, Recipe)> = self
            .select(|recipe| !recipe.deleted)?
            .into_iter()
            .filter_map(|recipe| {
                let score = text_score(&recipe, &terms);
                (score > 0).then_some((score, recipe))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(ranked.into_iter().map(|(_, recipe)| recipe).collect())
    }

    async fn tags(&self) -> Result<Vec<String>, RecipePersistenceError> {
        let mut tags: Vec<String> = self
            .select(|recipe| !recipe.deleted)?
            .into_iter()
            .flat_map(|recipe| recipe.tags)
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn all(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.select(|_| true)
    }

    async fn active(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.select(|recipe| !recipe.deleted)
    }

    async fn deleted(&self) -> Result<Vec<Recipe>, RecipePersistenceError> {
        self.select(|recipe| recipe.deleted)
    }

    async fn copy(&self, id: &RecipeId) -> Result<Option<Recipe>, RecipePersistenceError> {
        let source = self.guard()?.iter().find(|recipe| recipe.id == *id).cloned();
        source
            .map(|recipe| self.insert(recipe.copy_draft()))
            .transpose()
    }

    async fn add_tag(&self, id: &RecipeId, tag: &str) -> Result<usize, RecipePersistenceError> {
        self.update(id, |recipe, now| recipe.add_tag(tag, now))
    }

    async fn delete_tag(
        &self,
        id: &RecipeId,
        tag: &str,
    ) -> Result<usize, RecipePersistenceError> {
        self.update(id, |recipe, now| recipe.remove_tag(tag, now))
    }

    async fn mark_made(
        &self,
        id: &RecipeId,
        at: DateTime<Utc>,
    ) -> Result<usize, RecipePersistenceError> {
        self.update(id, |recipe, now| recipe.mark_made(at, now))
    }

    async fn delete(&self, id: &RecipeId) -> Result<usize, RecipePersistenceError> {
        self.update(id, |recipe, now| {
            recipe.soft_delete(now);
            true
        })
    }
}

fn text_score(recipe: &Recipe, terms: &[String]) -> u32 {
    let weighted = [
        (8, vec![recipe.name.to_lowercase()]),
        (4, recipe.tags.clone()),
        (2, recipe.ingredients.iter().map(|i| i.to_lowercase()).collect()),
        (1, recipe.directions.iter().map(|d| d.to_lowercase()).collect()),
    ];
    terms
        .iter()
        .map(|term| {
            weighted
                .iter()
                .filter(|(_, fields)| fields.iter().any(|field| field.contains(term.as_str())))
                .map(|(weight, _)| *weight)
                .sum::<u32>()
        })
        .sum()
}

/// Mutex-guarded user store.
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryUserRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            clock,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<User>>, UserPersistenceError> {
        lock(&self.users, "user").map_err(UserPersistenceError::connection)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>, UserPersistenceError> {
        let mut users = self.guard()?;
        if users.iter().any(|user| user.email == new_user.email) {
            return Ok(None);
        }
        let user = User::register(UserId::random(), new_user.clone(), self.clock.utc());
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.guard()?.iter().find(|user| user.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.guard()?.iter().find(|user| user.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.guard()?.clone())
    }

    async fn add_recipe(
        &self,
        user_id: &UserId,
        recipe_id: &RecipeId,
    ) -> Result<usize, UserPersistenceError> {
        let now = self.clock.utc();
        let mut users = self.guard()?;
        let added = users
            .iter_mut()
            .find(|user| user.id == *user_id)
            .is_some_and(|user| user.add_recipe(*recipe_id, now));
        Ok(usize::from(added))
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<usize, UserPersistenceError> {
        let now = self.clock.utc();
        let mut users = self.guard()?;
        let Some(user) = users.iter_mut().find(|user| user.id == *user_id) else {
            return Ok(0);
        };
        password_hash.clone_into(&mut user.password_hash);
        user.last_modified_date = now;
        Ok(1)
    }
}
