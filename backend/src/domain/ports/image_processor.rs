//! Port for turning uploaded images into stored thumbnails.
use std::path::Path;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures raised while processing an uploaded image.
    pub enum ImageProcessingError {
        /// Reading or writing image files failed.
        Io { message: String } => "image file access failed: {message}",
        /// The upload could not be decoded or encoded.
        Decode { message: String } => "image could not be processed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    /// Store a thumbnail for `upload` under a content-addressed filename.
    ///
    /// Returns the stored filename, or `None` when the file extension is not
    /// an allowed image type.
    async fn process(&self, upload: &Path) -> Result<Option<String>, ImageProcessingError>;
}
