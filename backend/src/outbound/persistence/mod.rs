//! PostgreSQL persistence adapters built on Diesel and `diesel-async`.
//!
//! Row structs and the schema stay private to this module; repositories
//! return domain records only.

mod diesel_db_initializer;
mod diesel_helpers;
mod diesel_recipe_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_db_initializer::{DieselDbInitializer, MIGRATIONS};
pub use diesel_recipe_repository::DieselRecipeRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
