//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{NewUser, RecipeId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `None` when the email is already registered.
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError>;

    /// Every registered user, oldest registration first.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Record ownership of a recipe. Returns the number of ids added.
    async fn add_recipe(
        &self,
        user_id: &UserId,
        recipe_id: &RecipeId,
    ) -> Result<usize, UserPersistenceError>;

    /// Replace the stored password hash. Returns the number of users updated.
    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<usize, UserPersistenceError>;
}
