//! 2D affine transformation matrix
//!
//! This module provides the full 2D affine matrix used for every frame
//! conversion in Vellum: shape local transforms, accumulated world
//! transforms, and the camera view matrix. The matrix maps a point as
//!
//! ```text
//! x' = a * x + c * y + tx
//! y' = b * x + d * y + ty
//! ```
//!
//! which is the usual column-vector convention for 2D vector graphics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D affine transformation matrix.
///
/// The six components correspond to the 3x3 homogeneous matrix
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

/// The result of decomposing a matrix into translate/rotate/scale/skew parts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decomposed {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Creates a pure translation matrix
    pub fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// Creates a pure (possibly anisotropic) scaling matrix
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Matrix {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Creates a pure rotation matrix for an angle in radians
    pub fn rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Creates the matrix `T(position) * R(rotation)`.
    ///
    /// This is how scene attributes (x, y, rotation) are folded back into
    /// a local transform after the transformer re-derives its geometry.
    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self::translation(position.x, position.y).append(&Self::rotation(rotation))
    }

    /// Composes two matrices: the returned matrix applies `other` first,
    /// then `self`.
    ///
    /// In matrix terms this is the product `self * other`, so chained
    /// appends read left to right as a product:
    /// `t.append(&s).append(&u)` is `T * S * U`.
    pub fn append(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            tx: self.a * other.tx + self.c * other.ty + self.tx,
            ty: self.b * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Composes a screen-space translation after this map: `T(offset) * self`
    pub fn translated(&self, offset: Vec2) -> Matrix {
        Matrix {
            tx: self.tx + offset.x,
            ty: self.ty + offset.y,
            ..*self
        }
    }

    /// Applies this transformation to a point
    pub fn apply(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    /// Applies only the linear part to a vector (direction/size),
    /// ignoring translation
    pub fn apply_vector(&self, vector: Vec2) -> Vec2 {
        Vec2::new(
            self.a * vector.x + self.c * vector.y,
            self.b * vector.x + self.d * vector.y,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Returns the inverse matrix, or `None` when the matrix is singular
    /// (zero determinant).
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        Some(Matrix {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    /// QR-style decomposition into translate/rotate/scale/skew.
    ///
    /// The branch taken depends on the first column: when it is nonzero
    /// the rotation is read off the first column and the shear lands in
    /// `skew_x`; when only the second column is nonzero the roles flip
    /// and the shear lands in `skew_y`. The all-zero matrix decomposes
    /// to all-zero parts.
    pub fn decompose(&self) -> Decomposed {
        let Matrix { a, b, c, d, tx, ty } = *self;
        let det = a * d - b * c;

        let mut result = Decomposed {
            x: tx,
            y: ty,
            rotation: 0.0,
            scale_x: 0.0,
            scale_y: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        };

        if a != 0.0 || b != 0.0 {
            let r = (a * a + b * b).sqrt();
            result.rotation = if b > 0.0 {
                (a / r).acos()
            } else {
                -(a / r).acos()
            };
            result.scale_x = r;
            result.scale_y = det / r;
            result.skew_x = (a * c + b * d) / det;
        } else if c != 0.0 || d != 0.0 {
            let s = (c * c + d * d).sqrt();
            result.rotation = std::f32::consts::FRAC_PI_2
                - if d > 0.0 {
                    (-c / s).acos()
                } else {
                    -(c / s).acos()
                };
            result.scale_x = det / s;
            result.scale_y = s;
            result.skew_y = (a * c + b * d) / det;
        }

        result
    }

    /// Componentwise comparison within an epsilon, for tests and
    /// change detection
    pub fn approx_eq(&self, other: &Matrix, epsilon: f32) -> bool {
        (self.a - other.a).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.c - other.c).abs() <= epsilon
            && (self.d - other.d).abs() <= epsilon
            && (self.tx - other.tx).abs() <= epsilon
            && (self.ty - other.ty).abs() <= epsilon
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_identity_apply() {
        let point = Vec2::new(3.0, -7.0);
        assert_eq!(Matrix::identity().apply(point), point);
    }

    #[test]
    fn test_append_applies_right_operand_first() {
        let translate = Matrix::translation(10.0, 0.0);
        let scale = Matrix::scaling(2.0, 2.0);

        // T * S: scale first, then translate
        let m = translate.append(&scale);
        assert_eq!(m.apply(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0));

        // S * T: translate first, then scale
        let m = scale.append(&translate);
        assert_eq!(m.apply(Vec2::new(1.0, 1.0)), Vec2::new(22.0, 2.0));
    }

    #[test]
    fn test_invert_round_trips() {
        let m = Matrix::translation(5.0, -3.0)
            .append(&Matrix::rotation(FRAC_PI_4))
            .append(&Matrix::scaling(2.0, 0.5));
        let inv = m.invert().unwrap();

        let product = m.append(&inv);
        assert!(product.approx_eq(&Matrix::IDENTITY, EPSILON));

        let point = Vec2::new(13.0, 42.0);
        let round_trip = inv.apply(m.apply(point));
        assert!((round_trip - point).length() < EPSILON);
    }

    #[test]
    fn test_invert_singular() {
        let m = Matrix::scaling(0.0, 1.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn test_decompose_translation_rotation_scale() {
        let m = Matrix::translation(7.0, 9.0)
            .append(&Matrix::rotation(FRAC_PI_4))
            .append(&Matrix::scaling(2.0, 3.0));
        let parts = m.decompose();

        assert!((parts.x - 7.0).abs() < EPSILON);
        assert!((parts.y - 9.0).abs() < EPSILON);
        assert!((parts.rotation - FRAC_PI_4).abs() < EPSILON);
        assert!((parts.scale_x - 2.0).abs() < EPSILON);
        assert!((parts.scale_y - 3.0).abs() < EPSILON);
        assert!(parts.skew_x.abs() < EPSILON);
        assert!(parts.skew_y.abs() < EPSILON);
    }

    #[test]
    fn test_decompose_negative_rotation() {
        let m = Matrix::rotation(-FRAC_PI_2);
        let parts = m.decompose();
        assert!((parts.rotation + FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_decompose_zero_first_column() {
        // a = b = 0 but c, d nonzero takes the second branch
        let m = Matrix {
            a: 0.0,
            b: 0.0,
            c: -1.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        };
        let parts = m.decompose();
        assert_eq!(parts.scale_x, 0.0);
        assert!((parts.scale_y - (2.0f32).sqrt()).abs() < EPSILON);
        assert!(parts.skew_x.abs() < EPSILON);
    }

    #[test]
    fn test_decompose_zero_matrix() {
        let m = Matrix {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            tx: 4.0,
            ty: 5.0,
        };
        let parts = m.decompose();
        assert_eq!(parts.rotation, 0.0);
        assert_eq!(parts.scale_x, 0.0);
        assert_eq!(parts.scale_y, 0.0);
        assert_eq!(parts.x, 4.0);
        assert_eq!(parts.y, 5.0);
    }

    #[test]
    fn test_from_position_rotation_matches_decompose() {
        let m = Matrix::from_position_rotation(Vec2::new(12.0, -4.0), 0.7);
        let parts = m.decompose();
        assert!((parts.x - 12.0).abs() < EPSILON);
        assert!((parts.y + 4.0).abs() < EPSILON);
        assert!((parts.rotation - 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_serde_round_trip() {
        let m = Matrix::translation(1.5, 2.5).append(&Matrix::rotation(0.3));
        let json = serde_json::to_string(&m).unwrap();
        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
