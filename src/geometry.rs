//! Image-space geometry shared by detection and control.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A 2-D point or offset
pub type Point2D = Vector2<f64>;

/// Axis-aligned face bounding box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x_min: f64,
    /// Top edge
    pub y_min: f64,
    /// Right edge
    pub x_max: f64,
    /// Bottom edge
    pub y_max: f64,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    #[must_use]
    pub const fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center of the box
    #[must_use]
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Area of the box; degenerate (inverted) boxes have zero area
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Squared Euclidean distance between this box's center and `point`
    #[must_use]
    pub fn squared_distance_to(&self, point: &Point2D) -> f64 {
        (self.center() - point).norm_squared()
    }
}
