//! Selection preview thumbnails.
//!
//! The preview shows the whole source image at thumbnail size with the
//! area outside the selection dimmed and the selection outlined by a
//! dashed accent-colored border.

use crate::config::Config;
use crate::error::Result;
use crate::geometry::SelectionRegion;
use crate::image_processing::{ImageProcessor, RasterImage};
use crate::loader::{load_image, ImageSource};
use crate::surface::{ImageSurface, PixelRect, RasterSurface, Stroke};
use image::{DynamicImage, ImageFormat, Rgba};
use std::time::Duration;
use tracing::debug;

/// 50% black laid over everything outside the selection.
pub const DIM_OVERLAY: Rgba<u8> = Rgba([0, 0, 0, 128]);

pub const BORDER_WIDTH: f64 = 2.0;
pub const BORDER_DASH: (f64, f64) = (4.0, 4.0);

/// Visual settings for a preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewStyle {
    /// Upper bound for the longer side of the thumbnail.
    pub max_size: u32,
    pub accent_color: Rgba<u8>,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        let config = Config::default();
        Self {
            max_size: config.preview_max_size,
            accent_color: config.accent_color,
        }
    }
}

/// Paints the dimmed bands and the dashed outline for `rect`.
///
/// The bands are top and bottom across the full width, then left and right
/// between them, so no pixel is dimmed twice.
pub fn draw_selection_overlay<S: RasterSurface>(surface: &mut S, rect: PixelRect, accent: Rgba<u8>) {
    let (w, h) = (surface.width() as f64, surface.height() as f64);

    // Top
    surface.fill_rect(PixelRect::new(0.0, 0.0, w, rect.y), DIM_OVERLAY);
    // Bottom
    surface.fill_rect(PixelRect::new(0.0, rect.bottom(), w, h - rect.bottom()), DIM_OVERLAY);
    // Left
    surface.fill_rect(PixelRect::new(0.0, rect.y, rect.x, rect.height), DIM_OVERLAY);
    // Right
    surface.fill_rect(
        PixelRect::new(rect.right(), rect.y, w - rect.right(), rect.height),
        DIM_OVERLAY,
    );

    let (on, off) = BORDER_DASH;
    surface.stroke_rect(rect, &Stroke::dashed(BORDER_WIDTH, accent, on, off));
}

/// Composes a preview from an already decoded image.
pub fn render_preview(
    image: &DynamicImage,
    region: &SelectionRegion,
    style: &PreviewStyle,
) -> Result<ImageSurface> {
    let region = region.clamped()?;
    let (width, height) = ImageProcessor::fit_within(image.width(), image.height(), style.max_size);

    let mut surface = ImageSurface::new(width, height, Rgba([0, 0, 0, 0]))?;
    surface.draw_image(image, PixelRect::new(0.0, 0.0, width as f64, height as f64));

    let rect = PixelRect::from_region(&region, width as f64, height as f64);
    draw_selection_overlay(&mut surface, rect, style.accent_color);
    Ok(surface)
}

/// Loads `source` and composes a PNG preview of `region` over it.
///
/// # Errors
///
/// - [`AppError::ImageLoad`](crate::AppError::ImageLoad) or
///   [`AppError::ImageLoadTimeout`](crate::AppError::ImageLoadTimeout) if the
///   source cannot be loaded within `timeout`; no retry is attempted
/// - [`AppError::CanvasUnavailable`](crate::AppError::CanvasUnavailable) if the
///   thumbnail surface cannot be allocated
pub async fn compose_preview(
    source: &ImageSource,
    region: &SelectionRegion,
    style: &PreviewStyle,
    timeout: Duration,
) -> Result<RasterImage> {
    let image = load_image(source, timeout).await?;
    let surface = render_preview(&image, region, style)?;
    let raster = surface.encode(ImageFormat::Png)?;

    debug!(
        ?region,
        width = raster.width,
        height = raster.height,
        "composed selection preview"
    );
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use image::RgbaImage;

    const GREY: Rgba<u8> = Rgba([200, 200, 200, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn grey_source(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, GREY))
    }

    fn style() -> PreviewStyle {
        PreviewStyle {
            max_size: 200,
            accent_color: RED,
        }
    }

    #[test]
    fn thumbnail_keeps_source_aspect() {
        let surface = render_preview(&grey_source(800, 400), &SelectionRegion::FULL, &style()).unwrap();
        assert_eq!((surface.width(), surface.height()), (200, 100));

        let surface = render_preview(&grey_source(50, 80), &SelectionRegion::FULL, &style()).unwrap();
        assert_eq!((surface.width(), surface.height()), (50, 80));
    }

    #[test]
    fn dims_outside_and_keeps_inside() {
        // 200x100 canvas, selection spans 50..150 x 25..75
        let region = SelectionRegion::new(25.0, 25.0, 50.0, 50.0);
        let surface = render_preview(&grey_source(400, 200), &region, &style()).unwrap();

        let inside = surface.pixel(100, 50).unwrap();
        assert!(inside[0] >= 198 && inside[3] == 255, "{:?} was modified", inside);

        for (x, y) in [(5, 5), (100, 10), (100, 90), (10, 50), (190, 50)] {
            let px = surface.pixel(x, y).unwrap();
            assert!(px[0] < 110 && px[0] > 90, "{:?} at {:?} not dimmed once", px, (x, y));
        }
    }

    #[test]
    fn border_uses_accent_color() {
        let region = SelectionRegion::new(25.0, 25.0, 50.0, 50.0);
        let surface = render_preview(&grey_source(400, 200), &region, &style()).unwrap();

        // Outline starts one pixel outside the selection's top-left corner
        assert_eq!(surface.pixel(49, 24), Some(RED));
        assert_eq!(surface.pixel(50, 25), Some(RED));
        // First gap along the top edge
        assert_ne!(surface.pixel(54, 24), Some(RED));
    }

    #[tokio::test]
    async fn compose_preview_encodes_png() {
        let source_png = ImageProcessor::encode(&grey_source(300, 300), ImageFormat::Png).unwrap();
        let raster = compose_preview(
            &ImageSource::Bytes(source_png.bytes),
            &SelectionRegion::new(10.0, 10.0, 20.0, 20.0),
            &style(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(raster.mime_type(), "image/png");
        assert_eq!((raster.width, raster.height), (200, 200));
    }

    #[tokio::test]
    async fn undecodable_source_fails_with_load_error() {
        let err = compose_preview(
            &ImageSource::Bytes(vec![0, 1, 2, 3]),
            &SelectionRegion::FULL,
            &style(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ImageLoad(_)));
    }
}
