//! Example: direct linear transform on all correspondences
//!
//! Without outliers the plain DLT is enough; with outliers it breaks down,
//! which is what the RANSAC example fixes.

use inlier_homography::synthetic::{generate, SceneConfig};
use inlier_homography::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Homography Estimation Example (DLT) ===\n");

    let focal = 1000.0;
    let mut rng = rand::thread_rng();

    for outliers in [0, 5] {
        let scene = generate(&SceneConfig::new(100, outliers, 0.5, focal), &mut rng)?;
        let h = find_homography(&scene.pts1, &scene.pts2)?;
        let (inliers, _) = count_homography_inliers(&h, &scene.pts1, &scene.pts2, 1.0)?;
        let err = homography_error(&scene.homography, &h, focal)?;

        println!("{outliers} outliers:");
        println!("  True H      = {:.3}", scene.homography.normalized()?.h);
        println!("  Estimated H = {:.3}", h.normalized()?.h);
        println!("  Inliers     = {inliers}/{}", scene.pts1.len());
        println!("  Error       = {err:.3}\n");
    }

    Ok(())
}
