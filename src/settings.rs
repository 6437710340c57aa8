//! RANSAC configuration.

use crate::error::{HomographyError, Result};
use crate::scoring::InlierConvention;

/// Configuration of a homography RANSAC run.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacSettings {
    /// Number of trials; the loop always runs exactly this many.
    pub iterations: usize,
    /// Inlier threshold on the one-way reprojection error, in pixels.
    pub threshold: f64,
    /// How errors are compared against `threshold`.
    pub inlier_convention: InlierConvention,
    /// Re-solve the DLT on the inliers of the best sample.
    pub refine: bool,
    /// Seed for the sampler; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Spread trials over the rayon pool. Requires a seed for reproducible
    /// results; without one a seed is drawn from entropy.
    #[cfg(feature = "parallel")]
    pub parallel: bool,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            iterations: 100,
            threshold: 1.0,
            inlier_convention: InlierConvention::Euclidean,
            refine: true,
            seed: None,
            #[cfg(feature = "parallel")]
            parallel: false,
        }
    }
}

impl RansacSettings {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_convention(mut self, convention: InlierConvention) -> Self {
        self.inlier_convention = convention;
        self
    }

    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    #[cfg(feature = "parallel")]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject thresholds no error could be compared against.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(HomographyError::InvalidParameter(format!(
            "threshold must be finite and non-negative, got {threshold}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_basic_ransac_setup() {
        let cfg = RansacSettings::default();
        assert_eq!(cfg.iterations, 100);
        assert!((cfg.threshold - 1.0).abs() < 1e-12);
        assert_eq!(cfg.inlier_convention, InlierConvention::Euclidean);
        assert!(cfg.refine);
        assert_eq!(cfg.seed, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builders_override_fields() {
        let cfg = RansacSettings::default()
            .with_iterations(10_000)
            .with_threshold(2.5)
            .with_seed(7)
            .with_refine(false)
            .with_convention(InlierConvention::SquaredThreshold);
        assert_eq!(cfg.iterations, 10_000);
        assert_eq!(cfg.threshold, 2.5);
        assert_eq!(cfg.seed, Some(7));
        assert!(!cfg.refine);
        assert_eq!(cfg.inlier_convention, InlierConvention::SquaredThreshold);
    }

    #[test]
    fn rejects_unusable_thresholds() {
        for t in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(RansacSettings::default().with_threshold(t).validate().is_err());
        }
        assert!(RansacSettings::default().with_threshold(0.0).validate().is_ok());
    }
}
