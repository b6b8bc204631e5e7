//! stagecanvas Core Library
//!
//! Coordinate mapping and mask synthesis for editing regions of an image
//! that is displayed "contained" (scaled to fit, centered, letterboxed)
//! inside a layout box.
//!
//! # Overview
//!
//! A user drags a selection over a displayed photo; an external image
//! generation service later needs a mask at its own resolution. The library
//! handles every step in between:
//!
//! - **Bounds**: where the image actually sits in its container, via [`geometry`]
//! - **Mapping**: pointer pixels ↔ image-relative percent, via [`mapping`]
//! - **Masks**: binary black/white rasters, via [`mask`]
//! - **Previews**: dimmed thumbnails with a dashed outline, via [`preview`]
//! - **Payloads**: source + mask bundled for the edit gateway, via [`payload`]
//!
//! # Quick Start
//!
//! ```ignore
//! use stagecanvas_core::{StageCanvas, SelectionRegion, ImageSource};
//!
//! let canvas = StageCanvas::new()?;
//! let region = SelectionRegion::new(25.0, 25.0, 50.0, 50.0);
//!
//! let mask = canvas.mask(&region)?;
//! let preview = canvas.preview(&ImageSource::from_arg("room.jpg"), &region).await?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and defaults
//! - [`error`]: Error types and result aliases
//! - [`geometry`]: Points, bounds and selection regions
//! - [`image_processing`]: Encoding and data URIs
//! - [`loader`]: Awaitable image loading with timeouts
//! - [`mapping`]: Pointer ↔ percent conversion
//! - [`mask`]: Mask synthesis
//! - [`payload`]: Edit request bundling
//! - [`preview`]: Preview composition
//! - [`surface`]: The drawing surface abstraction

pub mod config;
pub mod error;
pub mod geometry;
pub mod image_processing;
pub mod loader;
pub mod mapping;
pub mod mask;
pub mod payload;
pub mod preview;
pub mod surface;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use geometry::{compute_bounds, ImageBounds, Point, SelectionRegion};
pub use image_processing::RasterImage;
pub use loader::ImageSource;
pub use mapping::{to_container_pixel, to_image_percent};
pub use payload::{EditRequest, MaskSize};
pub use preview::PreviewStyle;

/// Main entry point for the library.
///
/// Holds a [`Config`] and applies its defaults (mask size, thumbnail size,
/// accent color, load timeout) to every operation. None of the operations
/// keep state between calls; the current selection belongs to the caller.
///
/// # Example
///
/// ```ignore
/// use stagecanvas_core::StageCanvas;
///
/// let canvas = StageCanvas::new()?;
/// let bounds = canvas.bounds(800.0, 400.0, 1000.0, 1000.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StageCanvas {
    config: Config,
}

impl StageCanvas {
    /// Creates an instance configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if an environment override is invalid.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Creates an instance with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the configuration fails validation.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Where an image of the given natural size lands in a container.
    pub fn bounds(
        &self,
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> ImageBounds {
        compute_bounds(container_width, container_height, image_width, image_height)
    }

    /// Maps a container-local pointer to image percent space.
    ///
    /// Returns `None` over the letterbox padding.
    pub fn locate(&self, pointer: Point, bounds: &ImageBounds) -> Option<Point> {
        to_image_percent(pointer, Point::default(), bounds)
    }

    /// Synthesizes a PNG mask at the configured resolution.
    pub fn mask(&self, region: &SelectionRegion) -> Result<RasterImage> {
        mask::synthesize_mask(region, self.config.mask_width, self.config.mask_height)
    }

    /// Loads `source` and composes a preview thumbnail of `region`.
    pub async fn preview(&self, source: &ImageSource, region: &SelectionRegion) -> Result<RasterImage> {
        preview::compose_preview(source, region, &self.preview_style(), self.config.load_timeout).await
    }

    /// Builds an edit request with a mask at the configured resolution.
    pub async fn edit_request(
        &self,
        source: &ImageSource,
        region: &SelectionRegion,
        prompt: impl Into<String>,
    ) -> Result<EditRequest> {
        let size = MaskSize::Fixed(self.config.mask_width, self.config.mask_height);
        EditRequest::build(source, region, prompt, size, self.config.load_timeout).await
    }

    pub fn preview_style(&self) -> PreviewStyle {
        PreviewStyle {
            max_size: self.config.preview_max_size,
            accent_color: self.config.accent_color,
        }
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}
