//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions to and from
//! the domain records live here so both repositories agree on them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;
use uuid::Uuid;

use crate::domain::{Recipe, RecipeId, Servings, User, UserId};

use super::schema::{recipes, users};

/// Row struct for reading from the recipes table.
///
/// Also loadable from raw SQL that selects the same column names.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub num_ingredients: i32,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub prep_time: f64,
    pub cook_time: f64,
    pub servings: String,
    pub tags: Vec<String>,
    pub notes: Vec<String>,
    pub rating: Option<f64>,
    pub favorite: bool,
    pub when_made: Vec<DateTime<Utc>>,
    pub deleted: bool,
    pub images: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        let num_ingredients =
            usize::try_from(row.num_ingredients).unwrap_or(row.ingredients.len());
        Self {
            id: RecipeId::from_uuid(row.id),
            name: row.name,
            num_ingredients,
            ingredients: row.ingredients,
            directions: row.directions,
            prep_time: row.prep_time,
            cook_time: row.cook_time,
            servings: Servings::parse(&row.servings),
            tags: row.tags,
            notes: row.notes,
            rating: row.rating,
            favorite: row.favorite,
            when_made: row.when_made,
            deleted: row.deleted,
            images: row.images,
            created_date: row.created_date,
            last_modified_date: row.last_modified_date,
        }
    }
}

/// Full recipe record for inserts and whole-row updates.
///
/// `id` is skipped by the changeset derive; `rating: None` writes `NULL`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = recipes)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RecipeRecord {
    pub id: Uuid,
    pub name: String,
    pub num_ingredients: i32,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub prep_time: f64,
    pub cook_time: f64,
    pub servings: String,
    pub tags: Vec<String>,
    pub notes: Vec<String>,
    pub rating: Option<f64>,
    pub favorite: bool,
    pub when_made: Vec<DateTime<Utc>>,
    pub deleted: bool,
    pub images: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<&Recipe> for RecipeRecord {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: *recipe.id.as_uuid(),
            name: recipe.name.clone(),
            num_ingredients: i32::try_from(recipe.ingredients.len()).unwrap_or(i32::MAX),
            ingredients: recipe.ingredients.clone(),
            directions: recipe.directions.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings.to_string(),
            tags: recipe.tags.clone(),
            notes: recipe.notes.clone(),
            rating: recipe.rating,
            favorite: recipe.favorite,
            when_made: recipe.when_made.clone(),
            deleted: recipe.deleted,
            images: recipe.images.clone(),
            created_date: recipe.created_date,
            last_modified_date: recipe.last_modified_date,
        }
    }
}

/// Single-column row for the distinct tag listing.
#[derive(Debug, QueryableByName)]
pub(crate) struct TagRow {
    #[diesel(sql_type = Text)]
    pub tag: String,
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub recipe_ids: Vec<Uuid>,
    pub shared_recipe_ids: Vec<Uuid>,
    pub email_distros: serde_json::Value,
}

impl TryFrom<UserRow> for User {
    type Error = serde_json::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email_distros: BTreeMap<String, Vec<String>> =
            serde_json::from_value(row.email_distros)?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_date: row.created_date,
            last_modified_date: row.last_modified_date,
            recipe_ids: row.recipe_ids.into_iter().map(RecipeId::from_uuid).collect(),
            shared_recipe_ids: row
                .shared_recipe_ids
                .into_iter()
                .map(RecipeId::from_uuid)
                .collect(),
            email_distros,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}
