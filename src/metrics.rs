//! Comparison of two homographies.
//!
//! Used to evaluate an estimate against ground truth; it plays no part in the
//! estimation itself.

use nalgebra::Matrix3;

use crate::error::{HomographyError, Result};
use crate::models::Homography;

/// Focal-normalized distance between two homographies.
///
/// Both matrices are brought to canonical scale (`H / H[2,2]`), and their
/// difference is conjugated by `diag(f, f, 1)`:
///
/// `D = diag(1/f, 1/f, 1) * (H1 - H2) * diag(f, f, 1)`
///
/// The result is the Frobenius norm of `D`. In pixel coordinates the
/// translation entries of a homography are about `f` times larger than the
/// rotation entries and the perspective entries about `f` times smaller; the
/// conjugation puts all of them on a comparable footing.
///
/// # Errors
/// `DegenerateNormalization` if either `H[2,2]` is (near-)zero and
/// `InvalidParameter` if `focal` is not a positive finite number.
pub fn homography_error(h1: &Homography, h2: &Homography, focal: f64) -> Result<f64> {
    if !(focal.is_finite() && focal > 0.0) {
        return Err(HomographyError::InvalidParameter(format!(
            "focal length must be positive and finite, got {focal}"
        )));
    }

    let diff = h1.normalized()?.h - h2.normalized()?.h;
    let k_inv = Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0 / focal, 1.0 / focal, 1.0));
    let k = Matrix3::from_diagonal(&nalgebra::Vector3::new(focal, focal, 1.0));
    Ok((k_inv * diff * k).norm())
}
