//! Recipe data transfer models and their set-like mutation rules.
//!
//! Adapters translate storage rows into [`Recipe`] before anything above the
//! persistence layer sees them. The mutation helpers on [`Recipe`] carry the
//! rules shared by every storage implementation: tag set semantics, one
//! "made" entry per calendar day, and soft deletion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Suffix appended to the name of a copied recipe.
pub const COPY_SUFFIX: &str = "_COPY";

/// Highest rating a recipe may carry.
pub const MAX_RATING: f64 = 5.0;

/// Stable recipe identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(Uuid);

impl RecipeId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecipeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Number of servings: a count when the source gave one, free text otherwise.
///
/// # Examples
/// ```
/// use recipebox::domain::Servings;
///
/// assert_eq!(Servings::parse("4"), Servings::Count(4));
/// assert_eq!(Servings::parse("6 bowls"), Servings::Text("6 bowls".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Servings {
    /// Plain serving count.
    Count(u32),
    /// Free-text yield such as "12 cookies".
    Text(String),
}

impl Servings {
    /// Interpret raw text, preferring a numeric count.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed
            .parse::<u32>()
            .map_or_else(|_| Self::Text(trimmed.to_owned()), Self::Count)
    }
}

impl Default for Servings {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl fmt::Display for Servings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One structured ingredient entry as captured by the recipe form.
///
/// Recipes store ingredients as free-text lines; [`Ingredient::to_line`]
/// produces that line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    /// Ingredient name, e.g. "flour".
    pub name: String,
    /// Amount, e.g. "2".
    pub quantity: String,
    /// Unit of measure, e.g. "cups".
    pub unit: String,
    /// Preparation note, e.g. "sifted".
    pub preparation: String,
}

impl Ingredient {
    /// Render the ingredient as a single free-text line.
    ///
    /// # Examples
    /// ```
    /// use recipebox::domain::Ingredient;
    ///
    /// let flour = Ingredient {
    ///     name: "flour".into(),
    ///     quantity: "2".into(),
    ///     unit: "cups".into(),
    ///     preparation: "sifted".into(),
    /// };
    /// assert_eq!(flour.to_line(), "2 cups flour, sifted");
    /// ```
    #[must_use]
    pub fn to_line(&self) -> String {
        let head = [&self.quantity, &self.unit, &self.name]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let preparation = self.preparation.trim();
        if preparation.is_empty() {
            head
        } else {
            format!("{head}, {preparation}")
        }
    }
}

/// Image attached to a recipe, derived from its stored filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecipeImage {
    /// Owning recipe.
    #[schema(value_type = String)]
    pub recipe_id: RecipeId,
    /// Filename relative to the configured image directory.
    pub filepath: String,
    /// Caption; empty unless supplied by the user.
    pub description: String,
}

/// Validation failures raised by [`RecipeDraft::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeValidationError {
    /// Name was blank once trimmed.
    EmptyName,
    /// No ingredient lines were supplied.
    NoIngredients,
    /// Preparation or cooking time was negative or not finite.
    InvalidTime { field: &'static str, value: f64 },
    /// Rating fell outside `[0, 5]`.
    RatingOutOfRange(f64),
}

impl fmt::Display for RecipeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "recipe name must not be empty"),
            Self::NoIngredients => write!(f, "recipe needs at least one ingredient"),
            Self::InvalidTime { field, value } => {
                write!(f, "{field} must be a non-negative number of minutes, got {value}")
            }
            Self::RatingOutOfRange(value) => {
                write!(f, "rating must be between 0 and {MAX_RATING}, got {value}")
            }
        }
    }
}

impl std::error::Error for RecipeValidationError {}

/// User-editable recipe fields used to create, edit, copy and import recipes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeDraft {
    pub name: String,
    pub prep_time: f64,
    pub cook_time: f64,
    pub servings: Servings,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub tags: Vec<String>,
    pub notes: Vec<String>,
    pub rating: Option<f64>,
    pub favorite: bool,
    pub images: Vec<String>,
}

impl RecipeDraft {
    /// Check the draft against the stored-document constraints.
    pub fn validate(&self) -> Result<(), RecipeValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecipeValidationError::EmptyName);
        }
        if self.ingredients.is_empty() {
            return Err(RecipeValidationError::NoIngredients);
        }
        for (field, value) in [("prep_time", self.prep_time), ("cook_time", self.cook_time)] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecipeValidationError::InvalidTime { field, value });
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=MAX_RATING).contains(&rating) {
                return Err(RecipeValidationError::RatingOutOfRange(rating));
            }
        }
        Ok(())
    }

    /// Return the draft with its tags normalised into a lower-cased set.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.tags = normalize_tags(self.tags);
        self
    }
}

/// Lower-case and trim a single tag.
#[must_use]
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalise tags, dropping blanks and duplicates while keeping first-seen order.
///
/// # Examples
/// ```
/// use recipebox::domain::normalize_tags;
///
/// let tags = normalize_tags::<Vec<String>, String>(vec!["Fast".into(), " fast ".into(), "".into(), "BBQ".into()]);
/// assert_eq!(tags, vec!["fast".to_owned(), "bbq".to_owned()]);
/// ```
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Recipe record returned by every storage implementation.
///
/// ## Invariants
/// - `num_ingredients == ingredients.len()`.
/// - `tags` are lower-cased and unique.
/// - `when_made` holds at most one entry per UTC calendar day.
/// - `last_modified_date` advances on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    #[schema(value_type = String)]
    pub id: RecipeId,
    pub name: String,
    pub num_ingredients: usize,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub prep_time: f64,
    pub cook_time: f64,
    pub servings: Servings,
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

impl Recipe {
    /// Build a fresh recipe from a draft.
    #[must_use]
    pub fn from_draft(id: RecipeId, draft: RecipeDraft, now: DateTime<Utc>) -> Self {
        let draft = draft.normalized();
        Self {
            id,
            name: draft.name,
            num_ingredients: draft.ingredients.len(),
            ingredients: draft.ingredients,
            directions: draft.directions,
            prep_time: draft.prep_time,
            cook_time: draft.cook_time,
            servings: draft.servings,
            tags: draft.tags,
            notes: draft.notes,
            rating: draft.rating,
            favorite: draft.favorite,
            when_made: Vec::new(),
            deleted: false,
            images: draft.images,
            created_date: now,
            last_modified_date: now,
        }
    }

    /// Overwrite the editable fields wholesale.
    ///
    /// Images are only replaced when the draft carries some, so editing the
    /// text of a recipe keeps its pictures.
    pub fn apply_draft(&mut self, draft: RecipeDraft, now: DateTime<Utc>) {
        let draft = draft.normalized();
        self.name = draft.name;
        self.num_ingredients = draft.ingredients.len();
        self.ingredients = draft.ingredients;
        self.directions = draft.directions;
        self.prep_time = draft.prep_time;
        self.cook_time = draft.cook_time;
        self.servings = draft.servings;
        self.tags = draft.tags;
        self.notes = draft.notes;
        self.rating = draft.rating;
        self.favorite = draft.favorite;
        if !draft.images.is_empty() {
            self.images = draft.images;
        }
        self.last_modified_date = now;
    }

    /// Draft for a copy of this recipe.
    ///
    /// Usage history, favourite status and images stay with the original.
    #[must_use]
    pub fn copy_draft(&self) -> RecipeDraft {
        RecipeDraft {
            name: format!("{}{COPY_SUFFIX}", self.name),
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings.clone(),
            ingredients: self.ingredients.clone(),
            directions: self.directions.clone(),
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            rating: self.rating,
            favorite: false,
            images: Vec::new(),
        }
    }

    /// Draft carrying every editable field of this recipe.
    #[must_use]
    pub fn to_draft(&self) -> RecipeDraft {
        RecipeDraft {
            name: self.name.clone(),
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings.clone(),
            ingredients: self.ingredients.clone(),
            directions: self.directions.clone(),
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            rating: self.rating,
            favorite: self.favorite,
            images: self.images.clone(),
        }
    }

    /// Add a tag; returns whether the tag set changed.
    pub fn add_tag(&mut self, tag: &str, now: DateTime<Utc>) -> bool {
        let tag = normalize_tag(tag);
        let changed = !tag.is_empty() && !self.tags.contains(&tag);
        if changed {
            self.tags.push(tag);
        }
        self.last_modified_date = now;
        changed
    }

    /// Remove a tag; returns whether the tag set changed.
    pub fn remove_tag(&mut self, tag: &str, now: DateTime<Utc>) -> bool {
        let tag = normalize_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|existing| existing != &tag);
        self.last_modified_date = now;
        self.tags.len() != before
    }

    /// Record that the recipe was made at `at`.
    ///
    /// Returns `false` without touching the recipe when an entry already
    /// exists for the same UTC calendar day.
    pub fn mark_made(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        if self.when_made.iter().any(|made| made.date_naive() == day) {
            return false;
        }
        self.when_made.push(at);
        self.last_modified_date = now;
        true
    }

    /// Flag the recipe as deleted.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.last_modified_date = now;
    }

    /// Whether the recipe carries every tag in `tags` (compared lower-cased).
    #[must_use]
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter()
            .map(|tag| normalize_tag(tag))
            .all(|tag| self.tags.contains(&tag))
    }

    /// Case-insensitive substring match on the name.
    #[must_use]
    pub fn name_contains(&self, text: &str) -> bool {
        self.name.to_lowercase().contains(&text.to_lowercase())
    }

    /// Image records for the stored filenames.
    #[must_use]
    pub fn image_models(&self) -> Vec<RecipeImage> {
        self.images
            .iter()
            .map(|filepath| RecipeImage {
                recipe_id: self.id,
                filepath: filepath.clone(),
                description: String::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "spam and eggs".into(),
            ingredients: vec!["spam".into(), "eggs".into()],
            directions: vec!["fry".into(), "eat".into()],
            tags: vec!["Breakfast".into(), "fast".into(), "breakfast".into()],
            ..RecipeDraft::default()
        }
    }

    #[fixture]
    fn recipe(draft: RecipeDraft) -> Recipe {
        Recipe::from_draft(RecipeId::random(), draft, at(1, 8))
    }

    #[rstest]
    fn from_draft_counts_ingredients_and_normalises_tags(recipe: Recipe) {
        assert_eq!(recipe.num_ingredients, recipe.ingredients.len());
        assert_eq!(recipe.tags, vec!["breakfast".to_owned(), "fast".to_owned()]);
        assert!(!recipe.deleted);
        assert_eq!(recipe.created_date, recipe.last_modified_date);
    }

    #[rstest]
    fn mark_made_is_idempotent_per_day(mut recipe: Recipe) {
        assert!(recipe.mark_made(at(2, 7), at(2, 7)));
        assert!(!recipe.mark_made(at(2, 22), at(2, 22)));
        assert_eq!(recipe.when_made.len(), 1);
        assert_eq!(recipe.last_modified_date, at(2, 7));
        assert!(recipe.mark_made(at(3, 7), at(3, 7)));
        assert_eq!(recipe.when_made.len(), 2);
    }

    #[rstest]
    fn tag_operations_have_set_semantics(mut recipe: Recipe) {
        let now = at(4, 9);
        assert!(!recipe.add_tag("FAST", now));
        assert!(recipe.add_tag("Dinner", now));
        assert!(!recipe.remove_tag("lunch", now));
        assert!(recipe.remove_tag("dinner", now));
        assert_eq!(recipe.tags, vec!["breakfast".to_owned(), "fast".to_owned()]);
        assert_eq!(recipe.last_modified_date, now);
    }

    #[rstest]
    fn copy_draft_suffixes_name_and_drops_history(mut recipe: Recipe) {
        recipe.favorite = true;
        recipe.images.push("abc.png".into());
        let copy = recipe.copy_draft();
        assert_eq!(copy.name, "spam and eggs_COPY");
        assert!(!copy.favorite);
        assert!(copy.images.is_empty());
        assert_eq!(copy.ingredients, recipe.ingredients);
    }

    #[rstest]
    fn apply_draft_keeps_images_when_none_supplied(mut recipe: Recipe, draft: RecipeDraft) {
        recipe.images.push("abc.png".into());
        let later = at(1, 8) + Duration::hours(1);
        recipe.apply_draft(draft, later);
        assert_eq!(recipe.images, vec!["abc.png".to_owned()]);
        assert_eq!(recipe.last_modified_date, later);
    }

    #[rstest]
    #[case::blank_name(RecipeDraft { name: " ".into(), ..draft() }, RecipeValidationError::EmptyName)]
    #[case::no_ingredients(
        RecipeDraft { ingredients: Vec::new(), ..draft() },
        RecipeValidationError::NoIngredients
    )]
    #[case::negative_time(
        RecipeDraft { cook_time: -1.0, ..draft() },
        RecipeValidationError::InvalidTime { field: "cook_time", value: -1.0 }
    )]
    #[case::rating(
        RecipeDraft { rating: Some(5.5), ..draft() },
        RecipeValidationError::RatingOutOfRange(5.5)
    )]
    fn validate_rejects_invalid_drafts(
        #[case] candidate: RecipeDraft,
        #[case] expected: RecipeValidationError,
    ) {
        assert_eq!(candidate.validate(), Err(expected));
    }

    #[rstest]
    fn has_all_tags_requires_every_tag(recipe: Recipe) {
        assert!(recipe.has_all_tags(&["BREAKFAST".into()]));
        assert!(recipe.has_all_tags(&["breakfast".into(), "fast".into()]));
        assert!(!recipe.has_all_tags(&["breakfast".into(), "dinner".into()]));
    }

    #[rstest]
    #[case("4", Servings::Count(4))]
    #[case(" 12 cookies ", Servings::Text("12 cookies".into()))]
    #[case("", Servings::Text(String::new()))]
    fn servings_parse(#[case] raw: &str, #[case] expected: Servings) {
        assert_eq!(Servings::parse(raw), expected);
    }

    #[rstest]
    #[case(Ingredient { name: "salt".into(), ..Ingredient::default() }, "salt")]
    #[case(
        Ingredient { name: "onion".into(), quantity: "1".into(), unit: String::new(), preparation: "diced".into() },
        "1 onion, diced"
    )]
    fn ingredient_lines(#[case] ingredient: Ingredient, #[case] expected: &str) {
        assert_eq!(ingredient.to_line(), expected);
    }
}
