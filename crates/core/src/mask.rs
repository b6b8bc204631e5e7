//! Binary selection masks for inpainting-style edit requests.
//!
//! White marks the pixels an edit may change, black the pixels it must
//! preserve. Masks are always regenerated from the region; nothing is
//! updated incrementally.

use crate::config::{DEFAULT_MASK_HEIGHT, DEFAULT_MASK_WIDTH};
use crate::error::Result;
use crate::geometry::SelectionRegion;
use crate::image_processing::RasterImage;
use crate::surface::{ImageSurface, PixelRect, RasterSurface};
use image::{ImageFormat, Rgba};
use tracing::debug;

pub const MASK_KEEP: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const MASK_EDIT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paints the mask for `region` onto an existing surface.
///
/// The whole surface is cleared to [`MASK_KEEP`] first. The region is
/// clamped to `[0, 100]` and mapped over the full surface.
pub fn render_mask<S: RasterSurface>(surface: &mut S, region: &SelectionRegion) -> Result<()> {
    let region = region.clamped()?;
    let (w, h) = (surface.width() as f64, surface.height() as f64);

    surface.fill_rect(PixelRect::new(0.0, 0.0, w, h), MASK_KEEP);
    surface.fill_rect(PixelRect::from_region(&region, w, h), MASK_EDIT);
    Ok(())
}

/// Rasterizes a mask for `region` and encodes it as PNG.
///
/// Identical inputs always produce byte-identical output.
///
/// # Errors
///
/// - [`AppError::InvalidRegion`](crate::AppError::InvalidRegion) for non-finite regions
/// - [`AppError::CanvasUnavailable`](crate::AppError::CanvasUnavailable) if the
///   output size cannot be allocated
/// - [`AppError::ImageProcessing`](crate::AppError::ImageProcessing) if encoding fails
pub fn synthesize_mask(region: &SelectionRegion, width: u32, height: u32) -> Result<RasterImage> {
    let mut surface = ImageSurface::new(width, height, MASK_KEEP)?;
    render_mask(&mut surface, region)?;

    let raster = surface.encode(ImageFormat::Png)?;
    debug!(?region, width, height, bytes = raster.bytes.len(), "synthesized mask");
    Ok(raster)
}

/// [`synthesize_mask`] at the default 1024x576 (16:9) output size.
pub fn synthesize_default_mask(region: &SelectionRegion) -> Result<RasterImage> {
    synthesize_mask(region, DEFAULT_MASK_WIDTH, DEFAULT_MASK_HEIGHT)
}
