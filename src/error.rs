//! Error types for the mark-vanish crate.

/// Errors that can occur while loading, selecting, inpainting or saving images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API key was configured, so no request can be made.
    #[error("API key is missing. Set GEMINI_API_KEY (or API_KEY) in the environment.")]
    MissingApiKey,

    /// The request to the generation API failed in transport.
    #[error("request to the generation API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The generation API answered with a non-success status.
    #[error("generation API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the API, or the raw body.
        message: String,
    },

    /// The API call succeeded but no image part came back.
    #[error("No image was returned by the AI.")]
    NoImageReturned,

    /// A string could not be read as a base64 data URI.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// An image payload was not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding image data.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A JSON document could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A selection argument could not be understood.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A shell command could not be understood.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
