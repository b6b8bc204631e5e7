//! Value types for the contained-image coordinate system.
//!
//! Two spaces are in play:
//!
//! - **Container pixels**: the layout box the image is drawn into.
//! - **Percent space**: `[0, 100]` on each axis, relative to the image's
//!   rendered content (never the container), so a selection stays valid
//!   across resizes and output resolutions.
//!
//! [`compute_bounds`] links the two by computing where a shrink-to-fit,
//! centered image lands inside its container.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// A 2D point. Units depend on context (pixels or percent).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The rendered placement of an image inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBounds {
    /// Horizontal letterbox padding from the container's left edge.
    pub offset_x: f64,
    /// Vertical letterbox padding from the container's top edge.
    pub offset_y: f64,
    /// Rendered (scaled) image width.
    pub width: f64,
    /// Rendered (scaled) image height.
    pub height: f64,
}

impl ImageBounds {
    /// Bounds that cover a whole surface with no letterboxing.
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            width,
            height,
        }
    }

    /// Whether an image-local pixel lies within the rendered image
    /// (edges inclusive).
    pub fn contains_local(&self, local: Point) -> bool {
        (0.0..=self.width).contains(&local.x) && (0.0..=self.height).contains(&local.y)
    }
}

fn is_degenerate(value: f64) -> bool {
    !value.is_finite() || value <= 0.0
}

/// Computes where an image lands when scaled to fit a container without
/// cropping, preserving aspect ratio and centered on both axes.
///
/// Any zero-sized (or non-finite) dimension yields the full container at
/// offset `(0, 0)`, a safe default before image metadata has loaded.
///
/// # Example
///
/// ```
/// use stagecanvas_core::geometry::compute_bounds;
///
/// let bounds = compute_bounds(800.0, 400.0, 1000.0, 1000.0);
/// assert_eq!((bounds.offset_x, bounds.offset_y), (200.0, 0.0));
/// assert_eq!((bounds.width, bounds.height), (400.0, 400.0));
/// ```
pub fn compute_bounds(
    container_width: f64,
    container_height: f64,
    image_width: f64,
    image_height: f64,
) -> ImageBounds {
    if [container_width, container_height, image_width, image_height]
        .into_iter()
        .any(is_degenerate)
    {
        return ImageBounds::full(container_width.max(0.0), container_height.max(0.0));
    }

    let container_aspect = container_width / container_height;
    let image_aspect = image_width / image_height;

    let (width, height) = if image_aspect > container_aspect {
        // Wider than the container: letterbox top and bottom
        (container_width, container_width / image_aspect)
    } else {
        // Pillarbox left and right
        (container_height * image_aspect, container_height)
    };

    ImageBounds {
        offset_x: (container_width - width) / 2.0,
        offset_y: (container_height - height) / 2.0,
        width,
        height,
    }
}

/// A user-drawn rectangle in percent space.
///
/// Callers are expected to keep `x + width <= 100` and `y + height <= 100`;
/// rasterizers call [`SelectionRegion::clamped`] before mapping to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Minimum extent (in percent) for a dragged selection to count.
pub const MIN_SELECTION_PERCENT: f64 = 1.0;

impl SelectionRegion {
    pub const FULL: SelectionRegion = SelectionRegion {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from two percent-space corners in any drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Whether a drag was large enough on both axes to be intentional.
    pub fn is_valid_selection(&self) -> bool {
        self.width >= MIN_SELECTION_PERCENT && self.height >= MIN_SELECTION_PERCENT
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Intersects the region with `[0, 100] x [0, 100]`.
    ///
    /// `{ x: 90, width: 30 }` becomes `{ x: 90, width: 10 }`; a region lying
    /// entirely outside collapses to zero extent at the nearest edge.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRegion`] if any field is not finite.
    pub fn clamped(&self) -> Result<Self> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(AppError::region(format!("non-finite value in {:?}", self)));
        }

        let x0 = self.x.min(self.right()).clamp(0.0, 100.0);
        let x1 = self.x.max(self.right()).clamp(0.0, 100.0);
        let y0 = self.y.min(self.bottom()).clamp(0.0, 100.0);
        let y1 = self.y.max(self.bottom()).clamp(0.0, 100.0);

        Ok(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Parses `x,y,width,height` (percent) as used on the command line.
impl std::str::FromStr for SelectionRegion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::region(format!("{:?}: {}", s, e)))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(AppError::region(format!(
                "expected x,y,width,height but got {:?}",
                s
            ))),
        }
    }
}
