//! Self-describing encoded images (`data:<mime>;base64,<payload>`).

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Media type assumed when none is declared.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// An image carried as base64 text plus its media type.
///
/// The payload is kept as base64 so it can be forwarded to the model or
/// persisted without re-encoding; it is only decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedImage {
    media_type: String,
    data: String,
}

impl EncodedImage {
    /// Wrap an already base64-encoded payload.
    #[must_use]
    pub fn from_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    #[must_use]
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::from_base64(media_type, STANDARD.encode(bytes))
    }

    /// Encode raw bytes, sniffing the media type from their magic number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the bytes are not a known image format.
    pub fn sniff(bytes: &[u8]) -> Result<Self> {
        let format =
            image::guess_format(bytes).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
        Ok(Self::from_bytes(format.to_mime_type(), bytes))
    }

    /// Parse a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUri`] if the scheme, separator or base64
    /// marker is missing.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::InvalidDataUri("missing data: scheme".to_string()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidDataUri("missing ',' separator".to_string()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::InvalidDataUri("payload is not base64".to_string()))?;
        let media_type = if media_type.is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            media_type
        };
        Ok(Self::from_base64(media_type, data))
    }

    /// Declared media type, e.g. `image/jpeg`.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Base64 payload without the URI header.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.data
    }

    /// Decoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Base64`] if the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(self.data.as_bytes())?)
    }

    /// Pixel dimensions, read from the image header.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or is not a readable image.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let bytes = self.decode()?;
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        Ok(reader.into_dimensions()?)
    }

    /// Image format implied by the media type, if known.
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.media_type)
    }

    /// Conventional file extension for the media type, e.g. `jpg`.
    #[must_use]
    pub fn extension(&self) -> Option<&'static str> {
        self.format()
            .and_then(|format| format.extensions_str().first().copied())
    }

    /// Size of the decoded payload in bytes, estimated from the base64 length.
    #[must_use]
    pub fn approx_byte_len(&self) -> usize {
        self.data.len() / 4 * 3
    }

    /// Render as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.data)
    }
}

impl FromStr for EncodedImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EncodedImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.to_string()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif"
        ),
        None => false,
    }
}
