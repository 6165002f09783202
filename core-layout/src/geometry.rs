//! Viewport-aware position math.
//!
//! Pure functions; the store in [`crate::store`] owns the state.

use serde::{Deserialize, Serialize};

/// Minimum gap kept between the window's bounding box and the viewport
/// edge, in logical pixels.
pub const VIEWPORT_MARGIN: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Clamp `position` so the element's bounding box stays within
/// `[margin, viewport - element - margin]` on both axes.
///
/// When the element plus margins exceeds the viewport on an axis the
/// position pins to the margin.
pub fn clamp_position(position: Point, element: Size, viewport: Viewport) -> Point {
    let max_x = (viewport.width - element.width - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN);
    let max_y = (viewport.height - element.height - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN);
    Point::new(
        position.x.clamp(VIEWPORT_MARGIN, max_x),
        position.y.clamp(VIEWPORT_MARGIN, max_y),
    )
}

/// The four positions an element can occupy flush against a viewport
/// corner, respecting the margin.
pub fn corner_positions(element: Size, viewport: Viewport) -> [Point; 4] {
    let right = (viewport.width - element.width - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN);
    let bottom = (viewport.height - element.height - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN);
    [
        Point::new(VIEWPORT_MARGIN, VIEWPORT_MARGIN),
        Point::new(right, VIEWPORT_MARGIN),
        Point::new(VIEWPORT_MARGIN, bottom),
        Point::new(right, bottom),
    ]
}

/// Snap `position` to the nearest viewport corner by squared distance.
pub fn snap_to_corner(position: Point, element: Size, viewport: Viewport) -> Point {
    let corners = corner_positions(element, viewport);
    corners
        .into_iter()
        .min_by(|a, b| {
            position
                .squared_distance(a)
                .total_cmp(&position.squared_distance(b))
        })
        .unwrap_or(position)
}
