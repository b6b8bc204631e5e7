//! Error types for the stagecanvas-core library.
//!
//! Out-of-bounds pointers and degenerate dimensions are not errors here:
//! the mapper returns `None` and the bounds calculator falls back to the
//! full container. Everything below is a real failure for the caller.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur within the stagecanvas-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (unparsable values, out-of-range sizes).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source image could not be read or decoded.
    #[error("Image load failed: {0}")]
    ImageLoad(String),

    /// The source image did not finish loading in time.
    #[error("Image load timed out after {0:?}")]
    ImageLoadTimeout(Duration),

    /// A drawing surface could not be allocated.
    #[error("Canvas unavailable: {0}")]
    CanvasUnavailable(String),

    /// Image encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The selection region has a non-finite field or could not be parsed.
    /// Regions that are empty after clamping are not an error.
    #[error("Invalid selection region: {0}")]
    InvalidRegion(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image load error with the given message.
    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Creates a canvas allocation error with the given message.
    pub fn canvas(msg: impl Into<String>) -> Self {
        Self::CanvasUnavailable(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates an invalid region error with the given message.
    pub fn region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Whether this error came from loading the source image,
    /// either a decode failure or an expired timeout.
    pub fn is_image_load(&self) -> bool {
        matches!(self, Self::ImageLoad(_) | Self::ImageLoadTimeout(_))
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
