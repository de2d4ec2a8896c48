//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{NewUser, RecipeId, User, UserId};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, is_unique_violation, map_pool_error_message,
};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> UserPersistenceError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    User::try_from(row)
        .map_err(|err| UserPersistenceError::query(format!("malformed email_distros: {err}")))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>, UserPersistenceError> {
        if self.find_by_email(&new_user.email).await?.is_some() {
            return Ok(None);
        }
        let user = User::register(UserId::random(), new_user.clone(), self.clock.utc());
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            name: &user.name,
            username: &user.username,
            email: &user.email,
            password_hash: &user.password_hash,
            created_date: user.created_date,
            last_modified_date: user.last_modified_date,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(Some(user)),
            Err(err) if is_unique_violation(&err) => {
                debug!(email = %new_user.email, "email registered concurrently");
                Ok(None)
            }
            Err(err) => Err(map_diesel_error(err, "create user")),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find user"))?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find user by email"))?;
        row.map(row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::created_date.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list users"))?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn add_recipe(
        &self,
        user_id: &UserId,
        recipe_id: &RecipeId,
    ) -> Result<usize, UserPersistenceError> {
        let now = self.clock.utc();
        let user_id = *user_id.as_uuid();
        let recipe_id = *recipe_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(mut owned) = users::table
                    .find(user_id)
                    .select(users::recipe_ids)
                    .for_update()
                    .first::<Vec<uuid::Uuid>>(conn)
                    .await
                    .optional()?
                else {
                    return Ok(0);
                };
                if owned.contains(&recipe_id) {
                    return Ok(0);
                }
                owned.push(recipe_id);
                diesel::update(users::table.find(user_id))
                    .set((
                        users::recipe_ids.eq(owned),
                        users::last_modified_date.eq(now),
                    ))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(1)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "add recipe to user"))
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<usize, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(user_id.as_uuid()))
            .set((
                users::password_hash.eq(password_hash),
                users::last_modified_date.eq(self.clock.utc()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "set password hash"))
    }
}
