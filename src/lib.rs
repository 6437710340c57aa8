//! # inlier-homography - planar homography estimation with RANSAC
//!
//! Estimates the 3x3 projective transform mapping one set of 2D points onto
//! another with the direct linear transform (DLT), and fits it robustly in
//! the presence of outlier correspondences with RANSAC.
//!
//! ## Quick Start
//!
//! ```rust
//! use inlier_homography::{estimate_homography, homography_error, RansacSettings};
//! use inlier_homography::synthetic::{generate, SceneConfig};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let scene = generate(&SceneConfig::new(60, 4, 0.3, 1000.0), &mut rng).unwrap();
//!
//! let settings = RansacSettings::default().with_iterations(500).with_seed(1);
//! let result = estimate_homography(&scene.pts1, &scene.pts2, &settings).unwrap();
//!
//! println!("{} inliers", result.inlier_count);
//! let err = homography_error(&scene.homography, &result.model, scene.focal).unwrap();
//! assert!(err < 0.5);
//! ```
//!
//! ## Building blocks
//!
//! - [`find_homography`]: DLT over all correspondences.
//! - [`count_homography_inliers`]: reprojection errors and inlier count.
//! - [`find_homography_ransac`]: fixed-iteration RANSAC, returning a
//!   [`RansacOutcome`](crate::core::RansacOutcome) that is `NoModel` when nothing
//!   had support.
//! - [`estimate_homography`]: RANSAC followed by a refit on the inliers.
//! - [`homography_error`]: focal-normalized distance between two homographies.
//!
//! The generic pipeline lives in [`core`] and is assembled from the
//! [`Estimator`], [`Sampler`] and [`Scoring`] traits, so other models or
//! sampling strategies can reuse the loop.
//!
//! ## Modules
//!
//! - **[`api`]**: slice-based entry points
//! - **[`core`]**: traits, the `Ransac` pipeline and its result fold
//! - **[`estimators`]**: the DLT homography estimator
//! - **[`samplers`]**: uniform sampling without replacement
//! - **[`scoring`]**: reprojection scoring and inlier conventions
//! - **[`metrics`]**: homography comparison
//! - **[`models`]**: the `Homography` type
//! - **[`settings`]**: RANSAC configuration
//! - **[`synthetic`]**: synthetic scenes with ground truth

pub mod api;
pub mod core;
pub mod error;
pub mod estimators;
pub mod metrics;
pub mod models;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod synthetic;
pub mod types;

pub use api::{
    count_homography_inliers, estimate_homography, find_homography, find_homography_ransac,
    find_homography_ransac_with_rng, refine_on_inliers, EstimationResult, HomographyOutcome,
};
pub use crate::core::{Estimator, LocalOptimizer, Sampler, Scoring};
pub use error::HomographyError;
pub use metrics::homography_error;
pub use models::Homography;
pub use scoring::InlierConvention;
pub use settings::RansacSettings;
pub use types::Point;
