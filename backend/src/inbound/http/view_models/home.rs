//! Landing and about page models.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Recipe;

/// `/` and `/index`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexViewModel {
    pub user_name: String,
    pub recipes: Vec<Recipe>,
    pub tags: Vec<String>,
}

/// `/about`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AboutViewModel {
    pub user_name: String,
    pub version: String,
}

impl AboutViewModel {
    pub fn new(user_name: String) -> Self {
        Self {
            user_name,
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}
