//! Example: DLT error as a function of correspondence noise
//!
//! Runs the direct DLT on outlier-free scenes for increasing noise levels,
//! several times per level.

use inlier_homography::synthetic::{generate, SceneConfig};
use inlier_homography::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let runs = 5;
    let noise_levels = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
    let focal = 1000.0;
    let mut rng = rand::thread_rng();

    for run in 1..=runs {
        for &noise in &noise_levels {
            let scene = generate(&SceneConfig::new(100, 0, noise, focal), &mut rng)?;
            let h = find_homography(&scene.pts1, &scene.pts2)?;
            let err = homography_error(&scene.homography, &h, focal)?;
            println!("Run {run}, noise {noise:.1}: error = {err:.3}");
        }
        println!("---------------------------------------");
    }

    Ok(())
}
