//! Pointer ↔ percent coordinate mapping.
//!
//! Pointer events arrive in client coordinates. The image occupies only
//! [`ImageBounds`] inside its container, so a point over the letterbox
//! padding has no image coordinate at all and maps to `None`.

use crate::geometry::{ImageBounds, Point};

/// Maps a pointer position to percent space relative to the rendered image.
///
/// # Arguments
/// * `pointer` - Pointer position in client coordinates
/// * `container_origin` - Client position of the container's top-left corner
/// * `bounds` - Where the image sits inside the container
///
/// # Returns
/// `None` when the pointer is outside the rendered image (e.g. over the
/// letterbox padding). Callers must not substitute a made-up point.
pub fn to_image_percent(pointer: Point, container_origin: Point, bounds: &ImageBounds) -> Option<Point> {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }

    let local = Point::new(
        pointer.x - container_origin.x - bounds.offset_x,
        pointer.y - container_origin.y - bounds.offset_y,
    );

    if !bounds.contains_local(local) {
        return None;
    }

    Some(Point::new(
        (local.x / bounds.width * 100.0).clamp(0.0, 100.0),
        (local.y / bounds.height * 100.0).clamp(0.0, 100.0),
    ))
}

/// Maps a percent-space point back to container pixels.
///
/// Percentages outside `[0, 100]` extrapolate linearly.
pub fn to_container_pixel(percent: Point, bounds: &ImageBounds) -> Point {
    Point::new(
        bounds.offset_x + percent.x / 100.0 * bounds.width,
        bounds.offset_y + percent.y / 100.0 * bounds.height,
    )
}
