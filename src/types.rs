//! Core shared types.
//!
//! Correspondences travel through the pipeline as a `DataMatrix` with one row
//! per pair, laid out as `[x1, y1, x2, y2]`. The slice-based API packs
//! `&[Point]` pairs into this layout after validating them.

use nalgebra::{DMatrix, Point2};

use crate::error::{HomographyError, Result};

/// Dynamic row-per-correspondence matrix of `f64`.
pub type DataMatrix = DMatrix<f64>;

/// A 2D point in pixel (or any planar) coordinates.
pub type Point = Point2<f64>;

/// Number of correspondences needed to pin down the 8 degrees of freedom of
/// a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Source point of correspondence `row`.
#[inline]
pub fn source_point(data: &DataMatrix, row: usize) -> Point {
    Point::new(data[(row, 0)], data[(row, 1)])
}

/// Target point of correspondence `row`.
#[inline]
pub fn target_point(data: &DataMatrix, row: usize) -> Point {
    Point::new(data[(row, 2)], data[(row, 3)])
}

/// Check that two point sequences form a usable correspondence set.
///
/// Rejects unequal lengths, fewer than `min_points` pairs and any NaN or
/// infinite coordinate.
pub fn validate_correspondences(pts1: &[Point], pts2: &[Point], min_points: usize) -> Result<()> {
    if pts1.len() != pts2.len() {
        return Err(HomographyError::LengthMismatch {
            left: pts1.len(),
            right: pts2.len(),
        });
    }
    if pts1.len() < min_points {
        return Err(HomographyError::NotEnoughPoints {
            required: min_points,
            got: pts1.len(),
        });
    }
    let bad = pts1
        .iter()
        .zip(pts2)
        .position(|(a, b)| !(a.coords.iter().chain(b.coords.iter()).all(|v| v.is_finite())));
    match bad {
        Some(index) => Err(HomographyError::NonFiniteCoordinate { index }),
        None => Ok(()),
    }
}

/// Pack validated correspondences into an `N x 4` data matrix.
pub fn to_data_matrix(pts1: &[Point], pts2: &[Point], min_points: usize) -> Result<DataMatrix> {
    validate_correspondences(pts1, pts2, min_points)?;

    let mut data = DataMatrix::zeros(pts1.len(), 4);
    for (i, (a, b)) in pts1.iter().zip(pts2).enumerate() {
        data[(i, 0)] = a.x;
        data[(i, 1)] = a.y;
        data[(i, 2)] = b.x;
        data[(i, 3)] = b.y;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn packs_rows_in_order() {
        let a = square();
        let b: Vec<Point> = a.iter().map(|p| Point::new(p.x + 3.0, p.y - 1.0)).collect();
        let data = to_data_matrix(&a, &b, MIN_CORRESPONDENCES).unwrap();

        assert_eq!(data.nrows(), 4);
        assert_eq!(data.ncols(), 4);
        for i in 0..4 {
            assert_eq!(source_point(&data, i), a[i]);
            assert_eq!(target_point(&data, i), b[i]);
        }
    }

    #[test]
    fn rejects_length_mismatch() {
        let a = square();
        let b = &a[..3];
        assert_eq!(
            validate_correspondences(&a, b, 4),
            Err(HomographyError::LengthMismatch { left: 4, right: 3 })
        );
    }

    #[test]
    fn rejects_too_few_points() {
        let a = &square()[..3];
        assert_eq!(
            validate_correspondences(a, a, 4),
            Err(HomographyError::NotEnoughPoints { required: 4, got: 3 })
        );
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let a = square();
        let mut b = square();
        b[2].y = f64::NAN;
        assert_eq!(
            validate_correspondences(&a, &b, 4),
            Err(HomographyError::NonFiniteCoordinate { index: 2 })
        );

        b[2].y = 0.0;
        b[1].x = f64::INFINITY;
        assert_eq!(
            validate_correspondences(&a, &b, 4),
            Err(HomographyError::NonFiniteCoordinate { index: 1 })
        );
    }
}
