//! High-level slice API.
//!
//! These functions validate plain point sequences, pack them into a
//! [`DataMatrix`](crate::types::DataMatrix) and drive the generic pipeline in
//! [`core`](crate::core) with the homography components.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{Consensus, LeastSquaresOptimizer, LocalOptimizer, Ransac, RansacOutcome, Scoring};
use crate::error::{HomographyError, Result};
use crate::estimators::homography::dlt;
use crate::estimators::HomographyEstimator;
use crate::models::Homography;
use crate::samplers::UniformRandomSampler;
use crate::scoring::{ReprojectionScoring, Score};
use crate::settings::{validate_threshold, RansacSettings};
use crate::types::{to_data_matrix, validate_correspondences, DataMatrix, Point, MIN_CORRESPONDENCES};

/// Result of [`find_homography_ransac`]: the best sampled homography with its
/// inlier count and full error vector, or `NoModel`.
pub type HomographyOutcome = RansacOutcome<Homography, Score>;

/// Result of [`estimate_homography`].
#[derive(Debug, Clone)]
pub struct EstimationResult {
    /// Final homography: refined on the inliers when refinement ran,
    /// otherwise the best sampled one.
    pub model: Homography,
    /// Best homography found from a 4-point sample.
    pub ransac_model: Homography,
    /// Inlier count of `ransac_model`.
    pub inlier_count: usize,
    /// Indices of the inliers of `ransac_model`.
    pub inliers: Vec<usize>,
    /// Reprojection error of every correspondence under `ransac_model`.
    pub errors: Vec<f64>,
    /// Whether `model` was re-estimated from the inliers.
    pub refined: bool,
    /// Number of trials performed.
    pub iterations: usize,
}

/// Homography mapping `pts1` onto `pts2` by DLT over all correspondences.
///
/// # Errors
/// `LengthMismatch`, `NotEnoughPoints` (fewer than 4),
/// `NonFiniteCoordinate`, or `CoordinateOverflow` when coordinates are so
/// large that the linear system leaves the `f64` range.
pub fn find_homography(pts1: &[Point], pts2: &[Point]) -> Result<Homography> {
    validate_correspondences(pts1, pts2, MIN_CORRESPONDENCES)?;
    dlt(pts1, pts2)
}

/// Project `pts1` through `h`, returning the number of correspondences whose
/// reprojection error is below `threshold` and the error of every one.
///
/// `errors[i]` belongs to `pts1[i] <-> pts2[i]` and does not depend on the
/// threshold.
pub fn count_homography_inliers(
    h: &Homography,
    pts1: &[Point],
    pts2: &[Point],
    threshold: f64,
) -> Result<(usize, Vec<f64>)> {
    validate_threshold(threshold)?;
    let data = to_data_matrix(pts1, pts2, 0)?;
    let (score, errors) = ReprojectionScoring::new(threshold).score(&data, h);
    Ok((score.inlier_count, errors))
}

/// Robustly fit a homography with RANSAC.
///
/// Runs exactly `settings.iterations` trials. The sampler is seeded from
/// `settings.seed` when present. No refinement happens here; see
/// [`estimate_homography`] or [`refine_on_inliers`].
pub fn find_homography_ransac(
    pts1: &[Point],
    pts2: &[Point],
    settings: &RansacSettings,
) -> Result<HomographyOutcome> {
    #[cfg(feature = "parallel")]
    {
        if settings.parallel {
            settings.validate()?;
            let data = to_data_matrix(pts1, pts2, MIN_CORRESPONDENCES)?;
            let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
            // run_parallel seeds one sampler per trial; this one only fills
            // the pipeline's sampler slot.
            let ransac = Ransac::new(
                settings.iterations,
                HomographyEstimator::new(),
                UniformRandomSampler::from_seed(seed),
                scoring_for(settings),
            );
            return Ok(ransac.run_parallel(&data, seed));
        }
    }

    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    find_homography_ransac_with_rng(pts1, pts2, settings, rng)
}

/// [`find_homography_ransac`] drawing samples from a caller-provided
/// generator. `settings.seed` and `settings.parallel` are ignored.
pub fn find_homography_ransac_with_rng<R: Rng>(
    pts1: &[Point],
    pts2: &[Point],
    settings: &RansacSettings,
    rng: R,
) -> Result<HomographyOutcome> {
    settings.validate()?;
    let data = to_data_matrix(pts1, pts2, MIN_CORRESPONDENCES)?;
    let mut ransac = Ransac::new(
        settings.iterations,
        HomographyEstimator::new(),
        UniformRandomSampler::with_rng(rng),
        scoring_for(settings),
    );
    Ok(ransac.run(&data))
}

/// Re-solve the DLT on the inliers of a RANSAC consensus.
///
/// Returns `None` when fewer than 4 inliers exist; the sampled model is then
/// the best available answer.
pub fn refine_on_inliers(
    data: &DataMatrix,
    consensus: &Consensus<Homography, Score>,
    scoring: &ReprojectionScoring,
) -> Option<Homography> {
    let inliers = consensus.inliers(scoring);
    if inliers.len() < MIN_CORRESPONDENCES {
        log::warn!("only {} inliers, refinement skipped", inliers.len());
        return None;
    }
    let optimizer = LeastSquaresOptimizer::new(HomographyEstimator::new());
    Some(optimizer.run(data, &inliers, &consensus.model))
}

/// RANSAC followed by a DLT refit on the inliers of the best sample.
///
/// # Errors
/// Input validation errors, or `NoModelFound` when no trial produced a
/// homography with at least one inlier.
pub fn estimate_homography(
    pts1: &[Point],
    pts2: &[Point],
    settings: &RansacSettings,
) -> Result<EstimationResult> {
    let outcome = find_homography_ransac(pts1, pts2, settings)?;
    let consensus = outcome.into_consensus().ok_or(HomographyError::NoModelFound)?;

    let scoring = scoring_for(settings);
    let inliers = consensus.inliers(&scoring);
    let refined = if settings.refine {
        let data = to_data_matrix(pts1, pts2, MIN_CORRESPONDENCES)?;
        refine_on_inliers(&data, &consensus, &scoring)
    } else {
        None
    };

    log::debug!(
        "homography from trial {} with {}/{} inliers{}",
        consensus.trial,
        consensus.score.inlier_count,
        pts1.len(),
        if refined.is_some() { ", refined" } else { "" }
    );

    Ok(EstimationResult {
        refined: refined.is_some(),
        model: refined.unwrap_or_else(|| consensus.model.clone()),
        ransac_model: consensus.model,
        inlier_count: consensus.score.inlier_count,
        inliers,
        errors: consensus.errors,
        iterations: settings.iterations,
    })
}

fn scoring_for(settings: &RansacSettings) -> ReprojectionScoring {
    ReprojectionScoring::new(settings.threshold).with_convention(settings.inlier_convention)
}
