//! Reprojection scoring.
//!
//! A candidate homography is scored by projecting every source point,
//! measuring the Euclidean distance to its target, and counting the points
//! that fall below the inlier threshold. The full error vector is returned
//! alongside the count, aligned index-for-index with the input rows.

use crate::core::Scoring;
use crate::models::Homography;
use crate::types::{source_point, target_point, DataMatrix};

/// How a per-point Euclidean error is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlierConvention {
    /// `error < threshold`; the error and the threshold are both pixels.
    #[default]
    Euclidean,
    /// Legacy `error < threshold²`. This mixes a distance with a squared
    /// distance, so the effective radius is `threshold²` pixels.
    SquaredThreshold,
}

impl InlierConvention {
    /// Largest error (exclusive) that still counts as an inlier.
    #[inline]
    pub fn cutoff(self, threshold: f64) -> f64 {
        match self {
            InlierConvention::Euclidean => threshold,
            InlierConvention::SquaredThreshold => threshold * threshold,
        }
    }
}

/// RANSAC score: the number of inliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    pub inlier_count: usize,
}

impl Score {
    pub fn new(inlier_count: usize) -> Self {
        Self { inlier_count }
    }
}

/// Count the rows of `errors` below `cutoff`.
///
/// NaN never compares below anything, so it is never an inlier.
#[inline]
pub fn count_below(errors: &[f64], cutoff: f64) -> usize {
    errors.iter().filter(|&&e| e < cutoff).count()
}

/// Inlier-count scoring on one-way reprojection error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectionScoring {
    threshold: f64,
    convention: InlierConvention,
}

impl ReprojectionScoring {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            convention: InlierConvention::default(),
        }
    }

    pub fn with_convention(mut self, convention: InlierConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn convention(&self) -> InlierConvention {
        self.convention
    }

    /// Per-row reprojection error of `model` over the whole data matrix.
    pub fn errors(&self, data: &DataMatrix, model: &Homography) -> Vec<f64> {
        (0..data.nrows())
            .map(|row| model.transfer_error(&source_point(data, row), &target_point(data, row)))
            .collect()
    }
}

impl Scoring<Homography> for ReprojectionScoring {
    type Score = Score;

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn is_inlier(&self, error: f64) -> bool {
        error < self.convention.cutoff(self.threshold)
    }

    fn score(&self, data: &DataMatrix, model: &Homography) -> (Score, Vec<f64>) {
        let errors = self.errors(data, model);
        let inlier_count = count_below(&errors, self.convention.cutoff(self.threshold));
        (Score::new(inlier_count), errors)
    }
}
