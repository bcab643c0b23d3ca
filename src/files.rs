//! File read/save capabilities behind the upload and download actions.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::encoded::{is_supported_image, EncodedImage};
use crate::error::{Error, Result};

/// Reading uploads and saving downloads.
pub trait ImageFiles {
    /// Read an image file into an encoded image.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an image.
    fn read_image(&self, path: &Path) -> Result<EncodedImage>;

    /// Save `image` under `file_name`, returning where it was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or the write fails.
    fn save_image(&self, image: &EncodedImage, file_name: &str) -> Result<PathBuf>;
}

/// File name for a download created at `timestamp_ms`.
///
/// Example: `vanished-1700000000000.png`.
#[must_use]
pub fn download_file_name(timestamp_ms: i64) -> String {
    format!("vanished-{timestamp_ms}.png")
}

/// Local filesystem access with a fixed download directory.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    download_dir: PathBuf,
}

impl LocalFiles {
    /// Write downloads into `download_dir`.
    #[must_use]
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }
}

impl ImageFiles for LocalFiles {
    fn read_image(&self, path: &Path) -> Result<EncodedImage> {
        if !is_supported_image(path) {
            return Err(Error::UnsupportedFormat(path.display().to_string()));
        }
        let bytes = fs::read(path)?;
        let image = EncodedImage::sniff(&bytes)?;
        tracing::debug!(path = %path.display(), media_type = image.media_type(), "read upload");
        Ok(image)
    }

    fn save_image(&self, image: &EncodedImage, file_name: &str) -> Result<PathBuf> {
        let path = self.download_dir.join(file_name);
        write_png(image, &path)?;
        Ok(path)
    }
}

/// Write `image` to `path` as PNG, re-encoding when the payload is another format.
///
/// # Errors
///
/// Returns an error if the payload cannot be decoded or the write fails.
pub fn write_png(image: &EncodedImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = image.decode()?;
    if image::guess_format(&bytes).ok() == Some(ImageFormat::Png) {
        fs::write(path, &bytes)?;
    } else {
        let decoded = image::load_from_memory(&bytes)?;
        let mut out = Cursor::new(Vec::new());
        decoded.write_to(&mut out, ImageFormat::Png)?;
        fs::write(path, out.into_inner())?;
    }
    tracing::info!(path = %path.display(), "saved image");
    Ok(())
}
