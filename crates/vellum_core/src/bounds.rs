//! Axis-aligned bounding box implementation using glam
//!
//! Bounds are used for spatial index entries, viewport culling, and the
//! transformer's selection box. Shapes themselves may be rotated; their
//! bounds are the axis-aligned box of the transformed corners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

/// An axis-aligned bounding box represented by minimum and maximum points
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// The minimum point (top-left in screen coordinates)
    pub min: Vec2,
    /// The maximum point (bottom-right in screen coordinates)
    pub max: Vec2,
}

impl Bounds {
    /// Creates a new bounds from minimum and maximum points
    ///
    /// Note: This doesn't validate that min is actually less than max.
    /// Use `from_corners` if you need automatic ordering.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates bounds from an origin point and size
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Creates bounds from center point and full size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half_size = size * 0.5;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Creates bounds from two corner points, automatically ordering them
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates the smallest bounds containing every given point.
    ///
    /// Returns a zero bounds at the origin when `points` is empty.
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut iter = points.iter();
        let Some(first) = iter.next() else {
            return Self::zero();
        };
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for point in iter {
            bounds.min = bounds.min.min(*point);
            bounds.max = bounds.max.max(*point);
        }
        bounds
    }

    /// Creates an empty bounds at the origin
    pub fn zero() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }

    /// Returns the origin (minimum point) of the bounds
    pub fn origin(&self) -> Vec2 {
        self.min
    }

    /// Returns the size of the bounds
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns the center point of the bounds
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the width of the bounds
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Returns the height of the bounds
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Checks if the bounds are empty (zero or negative size)
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Tests if this bounds intersects with another
    ///
    /// Two bounds intersect if they overlap in both X and Y axes.
    /// Touching edges count as intersecting, so a zero-size bounds still
    /// intersects anything containing its point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Computes the intersection of two bounds
    ///
    /// Returns None if the bounds don't intersect
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if min.x <= max.x && min.y <= max.y {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Computes the union of two bounds
    ///
    /// The union is the smallest bounds that contains both input bounds
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Tests if a point is contained within the bounds
    ///
    /// Points on the boundary are considered contained
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Tests if another bounds is entirely contained within this bounds
    pub fn contains_bounds(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Expands the bounds by a given amount in all directions
    pub fn expand(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Translates the bounds by a given offset
    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns the four corner points of the bounds
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,                          // top-left
            Vec2::new(self.max.x, self.min.y), // top-right
            self.max,                          // bottom-right
            Vec2::new(self.min.x, self.max.y), // bottom-left
        ]
    }

    /// Transforms the bounds through an affine matrix and returns the
    /// axis-aligned box of the four transformed corners.
    ///
    /// Under rotation the result is larger than the transformed rectangle
    /// itself; that is exactly what the spatial index wants.
    pub fn apply_matrix(&self, matrix: &Matrix) -> Self {
        let corners = self.corners().map(|corner| matrix.apply(corner));
        Self::from_points(&corners)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::zero()
    }
}
