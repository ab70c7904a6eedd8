//! Fundamental geometric types for the bridge world.
//!
//! World coordinates are measured in pixels with the Y axis pointing down, so a
//! larger `y` is closer to the ground.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Position in the two dimensional world measured in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the horizontal axis.
    pub x: f64,
    /// Distance along the vertical axis, growing downwards.
    pub y: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Angle of the segment from `self` to `other`, in radians.
    #[must_use]
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl From<Vector2<f64>> for Point {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Axis-aligned rectangle, used for terrain and hit boxes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Smallest X covered by the rectangle.
    pub left: f64,
    /// Smallest Y covered by the rectangle (its visual top).
    pub top: f64,
    /// Largest X covered by the rectangle.
    pub right: f64,
    /// Largest Y covered by the rectangle.
    pub bottom: f64,
}

impl Rect {
    /// Create a rectangle from its edges.
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Whether `point` lies inside or on the boundary of the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use bridgesim::point;
///
/// let anchor = point(200.0, 450.0);
/// assert_eq!(anchor.y, 450.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}
