//! Account use cases: registration, login and password changes.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::security::{HashStrength, PasswordHashError, hash_password, verify_password};
use crate::domain::{Error, NewUser, RecipeId, User, UserId};

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

/// Account service wrapping the user repository.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    strength: HashStrength,
}

impl AccountService {
    /// Create a service hashing new passwords with `strength`.
    pub fn new(users: Arc<dyn UserRepository>, strength: HashStrength) -> Self {
        Self { users, strength }
    }

    /// Look the user up by email and check the password.
    ///
    /// Returns `None` both for unknown emails and wrong passwords.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<Option<User>, Error> {
        let Some(user) = self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
        else {
            debug!(%email, "login for unknown email");
            return Ok(None);
        };
        if !verify_password(password, &user.password_hash) {
            debug!(user_id = %user.id, "login with wrong password");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Create an account; `None` when the email is already registered.
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, Error> {
        if self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Ok(None);
        }
        let password_hash = hash_password(password, self.strength).map_err(map_hash_error)?;
        let new_user = NewUser {
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash,
        };
        let created = self.users.create(&new_user).await.map_err(map_user_error)?;
        if let Some(user) = &created {
            info!(user_id = %user.id, "registered user");
        }
        Ok(created)
    }

    /// Fetch a user by identifier.
    pub async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }

    /// Every registered account, oldest first.
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    /// Record that `user_id` owns `recipe_id`.
    pub async fn add_recipe(&self, user_id: &UserId, recipe_id: &RecipeId) -> Result<usize, Error> {
        self.users
            .add_recipe(user_id, recipe_id)
            .await
            .map_err(map_user_error)
    }

    /// Replace the user's password. Returns `false` for unknown users.
    pub async fn change_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        let password_hash = hash_password(password, self.strength).map_err(map_hash_error)?;
        let updated = self
            .users
            .set_password_hash(user_id, &password_hash)
            .await
            .map_err(map_user_error)?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
    use rstest::rstest;

    fn stored_user(password: &str) -> User {
        let hash = hash_password(password, HashStrength::Fast).expect("hash");
        User::register(
            UserId::random(),
            NewUser {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password_hash: hash,
            },
            Utc::now(),
        )
    }

    fn service(repo: MockUserRepository) -> AccountService {
        AccountService::new(Arc::new(repo), HashStrength::Fast)
    }

    #[rstest]
    #[case("hunter22", true)]
    #[case("wrong", false)]
    #[tokio::test]
    async fn login_checks_the_password(#[case] attempt: &str, #[case] succeeds: bool) {
        let user = stored_user("hunter22");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("alice@example.com"))
            .return_once(move |_| Ok(Some(user)));

        let result = service(repo)
            .login_user("alice@example.com", attempt)
            .await
            .expect("login");
        assert_eq!(result.is_some(), succeeds);
    }

    #[tokio::test]
    async fn list_users_returns_every_account() {
        let first = stored_user("hunter22");
        let second = User::register(
            UserId::random(),
            NewUser {
                name: "Bob".into(),
                email: "bob@example.com".into(),
                password_hash: first.password_hash.clone(),
            },
            Utc::now(),
        );
        let expected = vec![first.clone(), second.clone()];
        let mut repo = MockUserRepository::new();
        repo.expect_list()
            .times(1)
            .return_once(move || Ok(vec![first, second]));

        let users = service(repo).list_users().await.expect("list");
        assert_eq!(users, expected);
    }

    #[tokio::test]
    async fn list_users_maps_query_failures_to_internal_errors() {
        let mut repo = MockUserRepository::new();
        repo.expect_list()
            .return_once(|| Err(UserPersistenceError::query("relation users missing")));

        let err = service(repo).list_users().await.expect_err("query failure");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn login_for_unknown_email_is_none() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().return_once(|_| Ok(None));
        let result = service(repo)
            .login_user("nobody@example.com", "pw")
            .await
            .expect("login");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn register_skips_create_for_known_email() {
        let existing = stored_user("hunter22");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .return_once(move |_| Ok(Some(existing)));
        repo.expect_create().never();

        let result = service(repo)
            .register_user("Alice", "alice@example.com", "other")
            .await
            .expect("register");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().return_once(|_| Ok(None));
        repo.expect_create()
            .withf(|new_user| {
                new_user.password_hash != "hunter22"
                    && verify_password("hunter22", &new_user.password_hash)
            })
            .return_once(|new_user| {
                Ok(Some(User::register(
                    UserId::random(),
                    new_user.clone(),
                    Utc::now(),
                )))
            });

        let user = service(repo)
            .register_user("Alice", "alice@example.com", "hunter22")
            .await
            .expect("register")
            .expect("created");
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn connection_failures_map_to_service_unavailable() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .return_once(|_| Err(UserPersistenceError::connection("refused")));
        let error = service(repo)
            .find_user_by_id(&UserId::random())
            .await
            .expect_err("connection failure");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn change_password_reports_unknown_users() {
        let mut repo = MockUserRepository::new();
        repo.expect_set_password_hash().return_once(|_, _| Ok(0));
        let changed = service(repo)
            .change_password(&UserId::random(), "new-password")
            .await
            .expect("change password");
        assert!(!changed);
    }
}
