//! Planar homography model.

use nalgebra::{Matrix3, Vector3};

use crate::error::{HomographyError, Result};
use crate::types::Point;

/// Planar projective transformation represented by a 3x3 matrix.
///
/// The matrix is only meaningful up to a nonzero scale; the bottom-right
/// entry is the anchor used when a canonical form is needed.
#[derive(Clone, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Build from nine row-major entries.
    pub fn from_row_slice(entries: &[f64; 9]) -> Self {
        Self::new(Matrix3::from_row_slice(entries))
    }

    /// Bottom-right entry, the canonical scale anchor.
    pub fn anchor(&self) -> f64 {
        self.h[(2, 2)]
    }

    /// The same transform with `H[2,2] == 1`.
    ///
    /// Fails when the anchor is zero (relative to the matrix magnitude) or
    /// not finite, since dividing would only produce infinities or NaNs.
    pub fn normalized(&self) -> Result<Self> {
        let anchor = self.anchor();
        if !anchor.is_finite() || anchor.abs() <= f64::EPSILON * self.h.norm() {
            return Err(HomographyError::DegenerateNormalization);
        }
        Ok(Self::new(self.h / anchor))
    }

    /// Map a point through the homography and dehomogenize.
    ///
    /// Points sent to the line at infinity come back with infinite or NaN
    /// coordinates; callers decide how to treat them.
    #[inline]
    pub fn project(&self, p: &Point) -> Point {
        let q = self.h * Vector3::new(p.x, p.y, 1.0);
        Point::new(q.x / q.z, q.y / q.z)
    }

    /// Euclidean distance between the projection of `source` and `target`.
    ///
    /// Non-finite distances are reported as `f64::INFINITY` so they always
    /// compare as outliers.
    #[inline]
    pub fn transfer_error(&self, source: &Point, target: &Point) -> f64 {
        let err = (self.project(source) - target).norm();
        if err.is_finite() {
            err
        } else {
            f64::INFINITY
        }
    }

    pub fn determinant(&self) -> f64 {
        self.h.determinant()
    }

    pub fn try_inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

impl From<Matrix3<f64>> for Homography {
    fn from(h: Matrix3<f64>) -> Self {
        Self::new(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalization_fixes_anchor_to_one() {
        let h = Homography::from_row_slice(&[2.0, 0.0, 4.0, 0.0, 2.0, 6.0, 0.0, 0.0, 2.0]);
        let n = h.normalized().unwrap();
        assert_relative_eq!(n.anchor(), 1.0);
        assert_relative_eq!(n.h[(0, 2)], 2.0);
        assert_relative_eq!(n.h[(1, 2)], 3.0);
    }

    #[test]
    fn normalization_rejects_zero_anchor() {
        let h = Homography::from_row_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(h.normalized(), Err(HomographyError::DegenerateNormalization));

        let zero = Homography::new(Matrix3::zeros());
        assert_eq!(zero.normalized(), Err(HomographyError::DegenerateNormalization));
    }

    #[test]
    fn projection_applies_translation() {
        let h = Homography::from_row_slice(&[1.0, 0.0, 10.0, 0.0, 1.0, 5.0, 0.0, 0.0, 1.0]);
        let p = h.project(&Point::new(1.0, 2.0));
        assert_relative_eq!(p.x, 11.0);
        assert_relative_eq!(p.y, 7.0);
    }

    #[test]
    fn projection_is_scale_invariant() {
        let h = Homography::from_row_slice(&[1.1, 0.2, 3.0, -0.1, 0.9, 4.0, 1e-3, 2e-3, 1.0]);
        let scaled = Homography::new(h.h * -7.5);
        let p = Point::new(12.0, -30.0);
        assert_relative_eq!(h.project(&p), scaled.project(&p), epsilon = 1e-9);
    }

    #[test]
    fn transfer_error_at_infinity_is_infinite() {
        // Third row maps every point to w = 0.
        let h = Homography::from_row_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let err = h.transfer_error(&Point::new(0.0, 0.0), &Point::new(0.0, 0.0));
        assert_eq!(err, f64::INFINITY);
    }
}
