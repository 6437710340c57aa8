//! Synthetic correspondence generator.
//!
//! Builds a homography induced by a camera rotation, `H = K R K^-1` with
//! `K = diag(f, f, 1)`, scatters source points over an image-sized window,
//! maps them through `H`, perturbs the targets and swaps a few of them for
//! unrelated points. Ground truth (homography, focal, outlier rows) is kept so
//! estimates can be scored with [`homography_error`](crate::metrics::homography_error).

use nalgebra::{Matrix3, Rotation3, Vector3};
use rand::Rng;

use crate::error::{HomographyError, Result};
use crate::models::Homography;
use crate::types::Point;

/// Draws allowed per outlier before the margin is declared unreachable.
const MAX_OUTLIER_ATTEMPTS: usize = 10_000;

/// Parameters of a synthetic scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Total number of correspondences, outliers included.
    pub num: usize,
    /// How many correspondences are replaced by unrelated pairs.
    pub outliers: usize,
    /// Targets are displaced by up to `noise` pixels per axis (uniform).
    pub noise: f64,
    /// Focal length in pixels.
    pub focal: f64,
    /// Source points are drawn from `[-half_extent, half_extent]^2`.
    pub half_extent: f64,
    /// Upper bound on each rotation angle, in radians.
    pub max_angle: f64,
    /// An outlier target lies at least this far from where its source projects.
    pub outlier_margin: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            num: 100,
            outliers: 0,
            noise: 0.0,
            focal: 1000.0,
            half_extent: 400.0,
            max_angle: 0.2,
            outlier_margin: 20.0,
        }
    }
}

impl SceneConfig {
    pub fn new(num: usize, outliers: usize, noise: f64, focal: f64) -> Self {
        Self {
            num,
            outliers,
            noise,
            focal,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.outliers > self.num {
            return Err(HomographyError::InvalidParameter(format!(
                "{} outliers requested for {} points",
                self.outliers, self.num
            )));
        }
        if !(self.focal.is_finite() && self.focal > 0.0) {
            return Err(HomographyError::InvalidParameter(format!(
                "focal length must be positive and finite, got {}",
                self.focal
            )));
        }
        let non_negative = [self.noise, self.max_angle, self.outlier_margin];
        if non_negative.iter().any(|v| !v.is_finite() || *v < 0.0)
            || !(self.half_extent.is_finite() && self.half_extent > 0.0)
        {
            return Err(HomographyError::InvalidParameter(
                "noise, angles, margin and extent must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generated correspondences with their ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    pub pts1: Vec<Point>,
    pub pts2: Vec<Point>,
    pub homography: Homography,
    pub focal: f64,
    /// Rows of `pts1`/`pts2` holding outliers, ascending.
    pub outlier_indices: Vec<usize>,
}

/// Homography induced by rotating a camera with focal `focal`.
pub fn rotation_homography(focal: f64, roll: f64, pitch: f64, yaw: f64) -> Homography {
    let k = Matrix3::from_diagonal(&Vector3::new(focal, focal, 1.0));
    let k_inv = Matrix3::from_diagonal(&Vector3::new(1.0 / focal, 1.0 / focal, 1.0));
    let r = Rotation3::from_euler_angles(roll, pitch, yaw);
    Homography::new(k * r.matrix() * k_inv)
}

/// Draw a scene from `config` using `rng`.
pub fn generate<R: Rng + ?Sized>(config: &SceneConfig, rng: &mut R) -> Result<SyntheticScene> {
    config.validate()?;

    let angle = |rng: &mut R| {
        if config.max_angle > 0.0 {
            rng.gen_range(-config.max_angle..=config.max_angle)
        } else {
            0.0
        }
    };
    let (roll, pitch, yaw) = (angle(&mut *rng), angle(&mut *rng), angle(&mut *rng));
    let homography = rotation_homography(config.focal, roll, pitch, yaw);

    let extent = config.half_extent;
    let mut pts1 = Vec::with_capacity(config.num);
    let mut pts2 = Vec::with_capacity(config.num);
    for _ in 0..config.num {
        let p = Point::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        let mut q = homography.project(&p);
        if config.noise > 0.0 {
            q.x += rng.gen_range(-config.noise..=config.noise);
            q.y += rng.gen_range(-config.noise..=config.noise);
        }
        pts1.push(p);
        pts2.push(q);
    }

    let mut outlier_indices: Vec<usize> =
        rand::seq::index::sample(&mut *rng, config.num, config.outliers).into_vec();
    outlier_indices.sort_unstable();
    for &i in &outlier_indices {
        let expected = homography.project(&pts1[i]);
        pts2[i] = (0..MAX_OUTLIER_ATTEMPTS)
            .map(|_| Point::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent)))
            .find(|q| (*q - expected).norm() >= config.outlier_margin)
            .ok_or_else(|| {
                HomographyError::InvalidParameter(format!(
                    "no outlier at least {} px from its projection within {} draws; \
                     margin too large for a window of half-extent {}",
                    config.outlier_margin, MAX_OUTLIER_ATTEMPTS, extent
                ))
            })?;
    }

    log::debug!(
        "synthetic scene: {} points, {} outliers, noise {}, focal {}",
        config.num,
        config.outliers,
        config.noise,
        config.focal
    );

    Ok(SyntheticScene {
        pts1,
        pts2,
        homography,
        focal: config.focal,
        outlier_indices,
    })
}
