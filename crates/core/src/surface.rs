//! Drawing surfaces.
//!
//! The mask and preview pipelines only talk to [`RasterSurface`], so they
//! can be exercised without a display. [`ImageSurface`] is the in-memory
//! implementation backed by an RGBA buffer.
//!
//! All rasterization uses hard edges: rectangle edges snap to the nearest
//! pixel boundary and every covered pixel is painted fully.

use crate::error::{AppError, Result};
use crate::geometry::{ImageBounds, Point, SelectionRegion};
use crate::image_processing::{ImageProcessor, RasterImage};
use crate::mapping::to_container_pixel;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::ops::Range;

/// Largest width or height a surface may be allocated with.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// A rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Maps a percent-space region onto a `width` x `height` surface with no
    /// letterboxing.
    pub fn from_region(region: &SelectionRegion, width: f64, height: f64) -> Self {
        let bounds = ImageBounds::full(width, height);
        let min = to_container_pixel(Point::new(region.x, region.y), &bounds);
        let max = to_container_pixel(Point::new(region.right(), region.bottom()), &bounds);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Snaps `[start, end)` to whole pixels and clips it to `[0, limit)`.
fn snap_span(start: f64, end: f64, limit: u32) -> Range<u32> {
    let clip = |v: f64| v.round().clamp(0.0, limit as f64) as u32;
    let (a, b) = (clip(start.min(end)), clip(start.max(end)));
    a..b
}

/// Outline style for [`RasterSurface::stroke_rect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Rgba<u8>,
    /// `(on, off)` lengths in pixels, or `None` for a solid line.
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub fn solid(width: f64, color: Rgba<u8>) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    pub fn dashed(width: f64, color: Rgba<u8>, on: f64, off: f64) -> Self {
        Self {
            width,
            color,
            dash: Some((on, off)),
        }
    }

    /// Whether the pixel `distance` pixels along the outline is painted.
    fn paints_at(&self, distance: f64) -> bool {
        match self.dash {
            Some((on, off)) if on > 0.0 && off > 0.0 => distance.rem_euclid(on + off) < on,
            _ => true,
        }
    }
}

/// A drawing surface the rendering pipelines paint onto.
pub trait RasterSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Composites `color` (source-over) onto every pixel inside `rect`.
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba<u8>);

    /// Scales `image` to `dest` and composites it onto the surface.
    fn draw_image(&mut self, image: &DynamicImage, dest: PixelRect);

    /// Outlines `rect` with the stroke centered on its edges.
    fn stroke_rect(&mut self, rect: PixelRect, stroke: &Stroke);

    /// Encodes the current contents.
    fn encode(&self, format: ImageFormat) -> Result<RasterImage>;
}

/// In-memory RGBA surface.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    pixels: RgbaImage,
}

impl ImageSurface {
    /// Allocates a surface filled with `background`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CanvasUnavailable`] if either side is zero or
    /// larger than [`MAX_SURFACE_SIDE`].
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AppError::canvas(format!(
                "cannot allocate a {}x{} surface",
                width, height
            )));
        }
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(AppError::canvas(format!(
                "{}x{} exceeds the {} pixel limit",
                width, height, MAX_SURFACE_SIDE
            )));
        }

        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, background),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if let Some(dst) = self.pixels.get_pixel_mut_checked(x, y) {
            *dst = blend_over(*dst, color);
        }
    }
}

/// Source-over compositing in 8-bit integer arithmetic.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let alpha = src[3] as u32;
    if alpha == 255 {
        return src;
    }
    if alpha == 0 {
        return dst;
    }

    let inv = 255 - alpha;
    let mix = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * inv + 127) / 255) as u8;
    let out_alpha = alpha + (dst[3] as u32 * inv + 127) / 255;

    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_alpha.min(255) as u8,
    ])
}

impl RasterSurface for ImageSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let xs = snap_span(rect.x, rect.right(), self.width());
        let ys = snap_span(rect.y, rect.bottom(), self.height());

        for y in ys {
            for x in xs.clone() {
                self.blend_pixel(x, y, color);
            }
        }
    }

    fn draw_image(&mut self, image: &DynamicImage, dest: PixelRect) {
        let w = dest.width.abs().round() as u32;
        let h = dest.height.abs().round() as u32;
        if w == 0 || h == 0 {
            return;
        }

        let scaled = if (w, h) == (image.width(), image.height()) {
            image.to_rgba8()
        } else {
            imageops::resize(image, w, h, FilterType::Triangle)
        };

        let left = dest.x.min(dest.right()).round() as i64;
        let top = dest.y.min(dest.bottom()).round() as i64;
        imageops::overlay(&mut self.pixels, &scaled, left, top);
    }

    fn stroke_rect(&mut self, rect: PixelRect, stroke: &Stroke) {
        if stroke.width <= 0.0 {
            return;
        }

        let half = stroke.width / 2.0;
        let (x0, x1) = (rect.x.min(rect.right()), rect.x.max(rect.right()));
        let (y0, y1) = (rect.y.min(rect.bottom()), rect.y.max(rect.bottom()));

        // Unclipped pixel edges of the outer and inner outline boundaries
        let outer_left = (x0 - half).round() as i64;
        let outer_right = (x1 + half).round() as i64;
        let outer_top = (y0 - half).round() as i64;
        let outer_bottom = (y1 + half).round() as i64;
        let inner_left = ((x0 + half).round() as i64).min(outer_right);
        let inner_right = ((x1 - half).round() as i64).max(inner_left);
        let inner_top = ((y0 + half).round() as i64).min(outer_bottom);
        let inner_bottom = ((y1 - half).round() as i64).max(inner_top);

        let run_x = (outer_right - outer_left) as f64;
        let run_y = (outer_bottom - outer_top) as f64;

        // Dash phase runs clockwise from the top-left corner
        let mut paint = |x: i64, y: i64, distance: f64| {
            if x >= 0 && y >= 0 && stroke.paints_at(distance) {
                self.blend_pixel(x as u32, y as u32, stroke.color);
            }
        };

        for y in outer_top..inner_top {
            for x in outer_left..outer_right {
                paint(x, y, (x - outer_left) as f64);
            }
        }
        for y in inner_top..inner_bottom {
            for x in inner_right..outer_right {
                paint(x, y, run_x + (y - outer_top) as f64);
            }
        }
        for y in inner_bottom..outer_bottom {
            for x in outer_left..outer_right {
                paint(x, y, run_x + run_y + (outer_right - 1 - x) as f64);
            }
        }
        for y in inner_top..inner_bottom {
            for x in outer_left..inner_left {
                paint(x, y, 2.0 * run_x + run_y + (outer_bottom - 1 - y) as f64);
            }
        }
    }

    fn encode(&self, format: ImageFormat) -> Result<RasterImage> {
        ImageProcessor::encode(&DynamicImage::ImageRgba8(self.pixels.clone()), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn rejects_unallocatable_surfaces() {
        assert!(matches!(
            ImageSurface::new(0, 10, BLACK),
            Err(AppError::CanvasUnavailable(_))
        ));
        assert!(matches!(
            ImageSurface::new(MAX_SURFACE_SIDE + 1, 10, BLACK),
            Err(AppError::CanvasUnavailable(_))
        ));
    }

    #[test]
    fn fill_rect_snaps_to_pixel_edges() {
        let mut surface = ImageSurface::new(10, 10, BLACK).unwrap();
        surface.fill_rect(PixelRect::new(2.4, 2.6, 3.2, 3.0), WHITE);

        // x: round(2.4)=2 .. round(5.6)=6, y: round(2.6)=3 .. round(5.6)=6
        assert_eq!(surface.pixel(2, 3), Some(WHITE));
        assert_eq!(surface.pixel(5, 5), Some(WHITE));
        assert_eq!(surface.pixel(6, 5), Some(BLACK));
        assert_eq!(surface.pixel(2, 2), Some(BLACK));
    }

    #[test]
    fn fill_rect_clips_to_surface() {
        let mut surface = ImageSurface::new(4, 4, BLACK).unwrap();
        surface.fill_rect(PixelRect::new(-10.0, -10.0, 100.0, 100.0), WHITE);
        assert!(surface.into_image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn translucent_fill_darkens() {
        let mut surface = ImageSurface::new(2, 1, Rgba([200, 100, 50, 255])).unwrap();
        surface.fill_rect(PixelRect::new(0.0, 0.0, 1.0, 1.0), Rgba([0, 0, 0, 128]));

        let dimmed = surface.pixel(0, 0).unwrap();
        assert_eq!(dimmed, Rgba([100, 50, 25, 255]));
        assert_eq!(surface.pixel(1, 0), Some(Rgba([200, 100, 50, 255])));
    }

    #[test]
    fn draw_image_scales_into_destination() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, RED));
        let mut surface = ImageSurface::new(8, 8, BLACK).unwrap();
        surface.draw_image(&source, PixelRect::new(2.0, 2.0, 4.0, 4.0));

        for (x, y) in [(2, 2), (5, 5), (3, 4)] {
            let px = surface.pixel(x, y).unwrap();
            assert!(px[0] > 250 && px[1] < 5 && px[2] < 5, "{:?} at {:?}", px, (x, y));
        }
        assert_eq!(surface.pixel(1, 1), Some(BLACK));
        assert_eq!(surface.pixel(6, 6), Some(BLACK));
    }

    #[test]
    fn solid_stroke_straddles_edges() {
        let mut surface = ImageSurface::new(20, 20, BLACK).unwrap();
        surface.stroke_rect(PixelRect::new(5.0, 5.0, 10.0, 10.0), &Stroke::solid(2.0, RED));

        // Outline covers [4, 6) on the left and [14, 16) on the right
        assert_eq!(surface.pixel(4, 10), Some(RED));
        assert_eq!(surface.pixel(5, 10), Some(RED));
        assert_eq!(surface.pixel(6, 10), Some(BLACK));
        assert_eq!(surface.pixel(15, 10), Some(RED));
        assert_eq!(surface.pixel(16, 10), Some(BLACK));
        assert_eq!(surface.pixel(10, 4), Some(RED));
        assert_eq!(surface.pixel(10, 15), Some(RED));
        assert_eq!(surface.pixel(10, 10), Some(BLACK));
    }

    #[test]
    fn dashed_stroke_alternates_along_top_edge() {
        let mut surface = ImageSurface::new(40, 20, BLACK).unwrap();
        let stroke = Stroke::dashed(2.0, RED, 4.0, 4.0);
        surface.stroke_rect(PixelRect::new(5.0, 5.0, 30.0, 10.0), &stroke);

        // Outer left edge is x = 4, so dashes cover 4..8, 12..16, ...
        for x in 4..8 {
            assert_eq!(surface.pixel(x, 4), Some(RED), "x = {}", x);
        }
        for x in 8..12 {
            assert_eq!(surface.pixel(x, 4), Some(BLACK), "x = {}", x);
        }
        assert_eq!(surface.pixel(12, 4), Some(RED));
    }

    #[test]
    fn region_maps_to_surface_pixels() {
        let rect = PixelRect::from_region(&SelectionRegion::new(25.0, 25.0, 50.0, 50.0), 1024.0, 576.0);
        assert_eq!(rect, PixelRect::new(256.0, 144.0, 512.0, 288.0));
    }

    #[test]
    fn png_encoding_is_deterministic() {
        let mut surface = ImageSurface::new(16, 9, BLACK).unwrap();
        surface.fill_rect(PixelRect::new(4.0, 2.0, 8.0, 5.0), WHITE);
        assert_eq!(
            surface.encode(ImageFormat::Png).unwrap(),
            surface.encode(ImageFormat::Png).unwrap()
        );
    }
}
