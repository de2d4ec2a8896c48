//! Recipe page and form models.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Ingredient, Recipe, RecipeDraft, RecipeImage, Servings, normalize_tags};
use crate::inbound::http::form::FormData;

const TIMES_ERROR: &str = "Times must be whole, non-negative numbers.";
const RATING_ERROR: &str = "The rating must be between 0 and 5.";

/// Blank reads as zero; anything else must be a non-negative integer.
fn whole_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        Some(0)
    } else {
        raw.parse().ok()
    }
}

fn rating(raw: &str) -> Result<Option<f64>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if (0.0..=5.0).contains(&value) => Ok(Some(value)),
        _ => Err(()),
    }
}

fn minutes_text(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.0}")
    } else {
        minutes.to_string()
    }
}

/// `/recipe/add` and `/recipe/edit/{id}` form.
///
/// Numeric fields stay raw text until validation so a bad value can be echoed
/// back alongside the error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RecipeFormViewModel {
    pub recipe_id: Option<String>,
    pub name: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub ingredients: Vec<Ingredient>,
    pub directions: Vec<String>,
    pub tags: Vec<String>,
    pub notes: Vec<String>,
    pub rating: String,
    pub favorite: bool,
    pub error: Option<String>,
}

impl RecipeFormViewModel {
    /// Read the submitted form. Ingredients come from the parallel `i_*` lists.
    pub fn from_form(form: &FormData) -> Self {
        let column = |name: &str, index: usize| {
            form.values(name)
                .get(index)
                .map(|value| value.trim().to_owned())
                .unwrap_or_default()
        };
        let ingredients = form
            .values("i_name")
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(index, name)| Ingredient {
                name: name.trim().to_owned(),
                quantity: column("i_quantity", index),
                unit: column("i_unit", index),
                preparation: column("i_preparation", index),
            })
            .collect();
        Self {
            recipe_id: None,
            name: form.value("name").trim().to_owned(),
            prep_time: form.value("prep_time").trim().to_owned(),
            cook_time: form.value("cook_time").trim().to_owned(),
            servings: form.value("servings").trim().to_owned(),
            ingredients,
            directions: form.lines("directions"),
            tags: normalize_tags(form.lines("tags")),
            notes: form.lines("notes"),
            rating: form.value("rating").trim().to_owned(),
            favorite: form.checked("favorite"),
            error: None,
        }
    }

    /// Prefill the edit form from a stored recipe.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            recipe_id: Some(recipe.id.to_string()),
            name: recipe.name.clone(),
            prep_time: minutes_text(recipe.prep_time),
            cook_time: minutes_text(recipe.cook_time),
            servings: recipe.servings.to_string(),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|line| Ingredient {
                    name: line.clone(),
                    ..Ingredient::default()
                })
                .collect(),
            directions: recipe.directions.clone(),
            tags: recipe.tags.clone(),
            notes: recipe.notes.clone(),
            rating: recipe.rating.map(|r| r.to_string()).unwrap_or_default(),
            favorite: recipe.favorite,
            error: None,
        }
    }

    pub fn validate(&mut self) {
        let numbers_ok = [&self.prep_time, &self.cook_time, &self.servings]
            .into_iter()
            .all(|raw| whole_number(raw).is_some());
        let message = if self.name.is_empty() {
            Some("You must specify a name.")
        } else if self.ingredients.is_empty() {
            Some("You must specify at least one ingredient.")
        } else if self.directions.is_empty() {
            Some("You must specify at least one direction.")
        } else if !numbers_ok {
            Some(TIMES_ERROR)
        } else if rating(&self.rating).is_err() {
            Some(RATING_ERROR)
        } else {
            None
        };
        self.error = message.map(str::to_owned);
    }

    /// Convert a validated form into a draft. Unparseable numbers read as zero.
    pub fn to_draft(&self) -> RecipeDraft {
        RecipeDraft {
            name: self.name.clone(),
            prep_time: f64::from(whole_number(&self.prep_time).unwrap_or(0)),
            cook_time: f64::from(whole_number(&self.cook_time).unwrap_or(0)),
            servings: Servings::Count(whole_number(&self.servings).unwrap_or(0)),
            ingredients: self.ingredients.iter().map(Ingredient::to_line).collect(),
            directions: self.directions.clone(),
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            rating: rating(&self.rating).ok().flatten(),
            favorite: self.favorite,
            images: Vec::new(),
        }
    }
}

/// Listing pages: all, deleted, recent and favourite recipes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeListViewModel {
    pub user_name: String,
    pub recipes: Vec<Recipe>,
}

/// `/recipe/view/{id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeViewModel {
    pub user_name: String,
    pub recipe: Recipe,
    pub images: Vec<RecipeImage>,
}

impl RecipeViewModel {
    pub fn new(user_name: String, recipe: Recipe) -> Self {
        let images = recipe.image_models();
        Self {
            user_name,
            recipe,
            images,
        }
    }
}

/// `/recipe/search`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchViewModel {
    pub user_name: String,
    pub search_text: String,
    pub recipes: Vec<Recipe>,
}

impl SearchViewModel {
    pub fn from_form(form: &FormData, user_name: String) -> Self {
        Self {
            user_name,
            search_text: form.value("search_text").trim().to_owned(),
            recipes: Vec::new(),
        }
    }
}

/// `/recipe/tag/{tags}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagViewModel {
    pub user_name: String,
    pub tags: Vec<String>,
    pub recipes: Vec<Recipe>,
}

/// Split the comma separated path segment into normalised tags.
pub fn parse_tag_path(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

/// Result of a tag or "made" mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct UpdateOutcome {
    /// Number of records changed: `0` when the call was a no-op.
    pub updated: usize,
}
