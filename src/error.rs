//! Error type shared by the public entry points.

use thiserror::Error;

/// Failures surfaced by the homography solver, scorer, metric and API.
///
/// Degenerate RANSAC samples never surface here: a poor candidate just
/// scores poorly and is discarded by the inlier comparison.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("point sequences differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("need at least {required} point correspondences, got {got}")]
    NotEnoughPoints { required: usize, got: usize },

    #[error("correspondence {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("homography has a (near-)zero bottom-right entry and cannot be normalized")]
    DegenerateNormalization,

    #[error("coordinates too large: the linear system overflows f64")]
    CoordinateOverflow,

    #[error("svd failed")]
    SvdFailed,

    #[error("ransac finished without finding a homography with any inliers")]
    NoModelFound,
}

pub type Result<T> = std::result::Result<T, HomographyError>;
