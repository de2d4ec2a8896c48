//! User data model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::RecipeId;

/// Validation errors returned when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Registered account.
///
/// The password hash never leaves the process: it is skipped when the user is
/// serialised into a response.
///
/// ## Invariants
/// - `email` is unique across users.
/// - `recipe_ids` lists recipes created by this user in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    #[schema(value_type = Vec<String>)]
    pub recipe_ids: Vec<RecipeId>,
    #[schema(value_type = Vec<String>)]
    pub shared_recipe_ids: Vec<RecipeId>,
    pub email_distros: BTreeMap<String, Vec<String>>,
}

impl User {
    /// Build a freshly registered user.
    #[must_use]
    pub fn register(id: UserId, new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new_user.name.clone(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_date: now,
            last_modified_date: now,
            recipe_ids: Vec::new(),
            shared_recipe_ids: Vec::new(),
            email_distros: BTreeMap::new(),
        }
    }

    /// Append a recipe to the owned list; returns whether it was new.
    pub fn add_recipe(&mut self, recipe_id: RecipeId, now: DateTime<Utc>) -> bool {
        if self.recipe_ids.contains(&recipe_id) {
            return false;
        }
        self.recipe_ids.push(recipe_id);
        self.last_modified_date = now;
        true
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alice() -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$hash".into(),
        }
    }

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    fn rejects_bad_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn register_uses_name_as_username() {
        let now = Utc::now();
        let user = User::register(UserId::random(), alice(), now);
        assert_eq!(user.username, "Alice");
        assert!(user.recipe_ids.is_empty());
        assert_eq!(user.created_date, now);
    }

    #[rstest]
    fn add_recipe_ignores_duplicates() {
        let mut user = User::register(UserId::random(), alice(), Utc::now());
        let recipe = RecipeId::random();
        assert!(user.add_recipe(recipe, Utc::now()));
        assert!(!user.add_recipe(recipe, Utc::now()));
        assert_eq!(user.recipe_ids, vec![recipe]);
    }

    #[rstest]
    fn serialisation_omits_password_hash() {
        let user = User::register(UserId::random(), alice(), Utc::now());
        let value = serde_json::to_value(&user).expect("serialise user");
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "alice@example.com");
    }
}
