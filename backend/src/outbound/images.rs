//! Filesystem image processor producing content-addressed thumbnails.
//!
//! An upload is renamed to the md5 of its bytes plus its original extension.
//! When that file already exists the upload is discarded; otherwise the image
//! is rotated upright from its EXIF orientation, shrunk to fit
//! [`THUMBNAIL_SIZE`] and written to the image directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageDecoder as _, ImageReader};
use tracing::debug;

use crate::domain::ports::{ImageProcessingError, ImageProcessor};

/// Longest edge of a stored thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 400;

/// Thumbnails uploads into a single directory.
#[derive(Debug, Clone)]
pub struct ThumbnailImporter {
    image_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl ThumbnailImporter {
    /// `allowed_extensions` are compared case-insensitively, without the dot.
    pub fn new<I, S>(image_dir: impl Into<PathBuf>, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            image_dir: image_dir.into(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    fn allowed_extension(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.allowed_extensions.contains(&ext).then_some(ext)
    }
}

#[async_trait]
impl ImageProcessor for ThumbnailImporter {
    async fn process(&self, upload: &Path) -> Result<Option<String>, ImageProcessingError> {
        let Some(ext) = self.allowed_extension(upload) else {
            return Ok(None);
        };
        let upload = upload.to_path_buf();
        let image_dir = self.image_dir.clone();
        tokio::task::spawn_blocking(move || import_blocking(&upload, &image_dir, &ext))
            .await
            .map_err(|err| ImageProcessingError::io(format!("image task failed: {err}")))?
    }
}

fn io_error(context: &str, path: &Path, err: std::io::Error) -> ImageProcessingError {
    ImageProcessingError::io(format!("{context} {}: {err}", path.display()))
}

fn import_blocking(
    upload: &Path,
    image_dir: &Path,
    ext: &str,
) -> Result<Option<String>, ImageProcessingError> {
    if !upload.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(upload).map_err(|err| io_error("cannot read", upload, err))?;
    let filename = format!("{:x}.{ext}", md5::compute(&bytes));
    let target = image_dir.join(&filename);
    std::fs::create_dir_all(image_dir).map_err(|err| io_error("cannot create", image_dir, err))?;

    if target.is_file() {
        debug!(%filename, "image already imported");
    } else {
        let thumbnail = upright(&bytes)?.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
        thumbnail
            .save(&target)
            .map_err(|err| ImageProcessingError::decode(format!("cannot encode thumbnail: {err}")))?;
    }
    if upload != target {
        std::fs::remove_file(upload).map_err(|err| io_error("cannot remove", upload, err))?;
    }
    Ok(Some(filename))
}

fn upright(bytes: &[u8]) -> Result<DynamicImage, ImageProcessingError> {
    let decode = |err: image::ImageError| ImageProcessingError::decode(err.to_string());
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| ImageProcessingError::decode(err.to_string()))?
        .into_decoder()
        .map_err(decode)?;
    let orientation = decoder.orientation().map_err(decode)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode)?;
    image.apply_orientation(orientation);
    Ok(image)
}
