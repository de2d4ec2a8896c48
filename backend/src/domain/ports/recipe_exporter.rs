//! Port for the printable recipe export and its metadata round trip.
use std::path::Path;

use async_trait::async_trait;

use crate::domain::{Recipe, RecipeDraft};

use super::define_port_error;

define_port_error! {
    /// Failures raised by export adapters.
    pub enum RecipeExportError {
        /// Reading or writing the document failed.
        Io { message: String } => "export file access failed: {message}",
        /// The document was not a recipe export or could not be built.
        Format { message: String } => "export document invalid: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeExporter: Send + Sync {
    /// Write `recipe` to a document at `path`, embedding its fields as metadata.
    async fn export(&self, recipe: &Recipe, path: &Path) -> Result<(), RecipeExportError>;

    /// Read back the recipes embedded in a document written by [`Self::export`].
    async fn import(&self, path: &Path) -> Result<Vec<RecipeDraft>, RecipeExportError>;
}
