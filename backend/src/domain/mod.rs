//! Domain primitives, use cases and ports.
//!
//! Purpose: hold the transport- and storage-agnostic part of the service.
//! Inbound adapters (HTTP) call the use cases here; outbound adapters
//! (PostgreSQL, in-memory, filesystem, remote pages) implement the ports.

pub mod account_service;
pub mod error;
pub mod ports;
pub mod recipe;
pub mod recipe_service;
pub mod security;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode};
pub use self::recipe::{
    COPY_SUFFIX, Ingredient, MAX_RATING, Recipe, RecipeDraft, RecipeId, RecipeImage,
    RecipeValidationError, Servings, normalize_tag, normalize_tags,
};
pub use self::recipe_service::{RecipeFilePaths, RecipeService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{NewUser, User, UserId, UserValidationError};
