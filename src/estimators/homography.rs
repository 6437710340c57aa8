//! Homography estimator using the direct linear transform (DLT).

use nalgebra::{DMatrix, Matrix3};

use crate::core::Estimator;
use crate::error::{HomographyError, Result};
use crate::models::Homography;
use crate::types::{source_point, target_point, DataMatrix, Point, MIN_CORRESPONDENCES};

/// Iteration cap for the SVD; well-conditioned 9-column systems converge in
/// far fewer.
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Solve for `H` with `pts2 ~ H * pts1` from two aligned point sequences.
///
/// Each correspondence contributes two rows to a `2N x 9` design matrix and
/// `h` is the right singular vector of its smallest singular value. The
/// result has unit Frobenius norm and is not rescaled. Rank-deficient input
/// (duplicate or collinear points) still yields a matrix; it just may not be
/// a meaningful homography.
pub fn dlt(pts1: &[Point], pts2: &[Point]) -> Result<Homography> {
    if pts1.len() != pts2.len() {
        return Err(HomographyError::LengthMismatch {
            left: pts1.len(),
            right: pts2.len(),
        });
    }
    if pts1.len() < MIN_CORRESPONDENCES {
        return Err(HomographyError::NotEnoughPoints {
            required: MIN_CORRESPONDENCES,
            got: pts1.len(),
        });
    }

    let mut a = DMatrix::<f64>::zeros(2 * pts1.len(), 9);
    for (i, (p1, p2)) in pts1.iter().zip(pts2).enumerate() {
        fill_rows(&mut a, i, p1, p2);
    }
    solve_null_space(a)
}

/// Write the two constraint rows of correspondence `i` into `a`.
#[inline]
fn fill_rows(a: &mut DMatrix<f64>, i: usize, p1: &Point, p2: &Point) {
    let (xa, ya) = (p1.x, p1.y);
    let (xb, yb) = (p2.x, p2.y);
    let r0 = 2 * i;
    let r1 = 2 * i + 1;

    a[(r0, 0)] = xa;
    a[(r0, 1)] = ya;
    a[(r0, 2)] = 1.0;
    a[(r0, 6)] = -xa * xb;
    a[(r0, 7)] = -ya * xb;
    a[(r0, 8)] = -xb;

    a[(r1, 3)] = xa;
    a[(r1, 4)] = ya;
    a[(r1, 5)] = 1.0;
    a[(r1, 6)] = -xa * yb;
    a[(r1, 7)] = -ya * yb;
    a[(r1, 8)] = -yb;
}

/// Minimizer of `|A h|` subject to `|h| = 1`, reshaped row-major to 3x3.
fn solve_null_space(a: DMatrix<f64>) -> Result<Homography> {
    // nalgebra computes a thin SVD, so a wide system (the 4-point case is
    // 8x9) needs zero rows to expose the null-space direction in V^T.
    let a = if a.nrows() < a.ncols() {
        let cols = a.ncols();
        a.resize_vertically(cols, 0.0)
    } else {
        a
    };

    // Products of large coordinates can overflow; nalgebra's SVD does not
    // converge on non-finite input.
    if !a.iter().all(|v| v.is_finite()) {
        return Err(HomographyError::CoordinateOverflow);
    }

    let svd = a
        .try_svd(false, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(HomographyError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(HomographyError::SvdFailed)?;
    let smallest = svd.singular_values.imin();
    let h = v_t.row(smallest);

    let mut h_mat = Matrix3::<f64>::zeros();
    for r in 0..3 {
        for c in 0..3 {
            h_mat[(r, c)] = h[3 * r + c];
        }
    }
    Ok(Homography::new(h_mat))
}

/// Homography estimator plugging the DLT into the RANSAC pipeline.
///
/// Works for the minimal 4-point sample and for any larger subset, which is
/// what inlier refinement relies on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl HomographyEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl Estimator for HomographyEstimator {
    type Model = Homography;

    fn sample_size(&self) -> usize {
        MIN_CORRESPONDENCES
    }

    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool {
        if sample.len() < self.sample_size() {
            return false;
        }
        let n = data.nrows();
        for i in 0..sample.len() {
            if sample[i] >= n {
                return false;
            }
            for j in (i + 1)..sample.len() {
                if sample[i] == sample[j] {
                    return false;
                }
            }
        }
        true
    }

    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model> {
        if sample.len() < self.sample_size() {
            return Vec::new();
        }

        let mut a = DMatrix::<f64>::zeros(2 * sample.len(), 9);
        for (i, &idx) in sample.iter().enumerate() {
            fill_rows(&mut a, i, &source_point(data, idx), &target_point(data, idx));
        }

        match solve_null_space(a) {
            Ok(model) => vec![model],
            Err(err) => {
                log::warn!("dlt on {} correspondences failed: {}", sample.len(), err);
                Vec::new()
            }
        }
    }

    fn is_valid_model(
        &self,
        model: &Homography,
        _data: &DataMatrix,
        _sample: &[usize],
        _threshold: f64,
    ) -> bool {
        // Near-singular candidates are left to the scorer; only garbage
        // produced by non-finite arithmetic is rejected here.
        model.h.iter().all(|v| v.is_finite())
    }
}
