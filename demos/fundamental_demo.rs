//! Example: a-contrario fundamental matrix estimation
//!
//! Demonstrates threshold-free epipolar geometry estimation on synthetic
//! correspondences from two translated camera views.

use nalgebra::DMatrix;
use orsa::{estimate_fundamental, OrsaSettings};
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== A-Contrario Fundamental Matrix Estimation ===\n");

    let n_points = 40;
    let n_outliers = 15;
    let n_total = n_points + n_outliers;

    let mut rng = rand::thread_rng();
    let mut points1 = DMatrix::<f64>::zeros(n_total, 2);
    let mut points2 = DMatrix::<f64>::zeros(n_total, 2);

    // Inliers: 3D points at varying depth seen from two cameras related by a
    // horizontal translation, so matches share their epipolar (scan) lines.
    for i in 0..n_points {
        let x_3d = (i as f64) * 2.0 - 40.0;
        let y_3d = ((i * 11) % n_points) as f64 * 1.5 - 30.0;
        let z_3d = 8.0 + ((i * 3) % 7) as f64;

        points1[(i, 0)] = 100.0 * x_3d / z_3d;
        points1[(i, 1)] = 100.0 * y_3d / z_3d;
        points2[(i, 0)] = 100.0 * (x_3d - 2.0) / z_3d + rng.gen_range(-0.05..0.05);
        points2[(i, 1)] = points1[(i, 1)] + rng.gen_range(-0.05..0.05);
    }

    // Outliers: random correspondences.
    for i in n_points..n_total {
        points1[(i, 0)] = rng.gen_range(-400.0..400.0);
        points1[(i, 1)] = rng.gen_range(-300.0..300.0);
        points2[(i, 0)] = rng.gen_range(-400.0..400.0);
        points2[(i, 1)] = rng.gen_range(-300.0..300.0);
    }

    println!("Generated {} inliers and {} outliers", n_points, n_outliers);
    println!("Two views related by a pure horizontal translation\n");

    let settings = OrsaSettings {
        max_iterations: 2000,
        ..OrsaSettings::default()
    };
    let result = estimate_fundamental(&points1, &points2, &settings)?;

    println!("Estimation results:");
    println!("  Found {} inliers out of {} points", result.inliers.len(), n_total);
    println!("  log10(NFA): {:.2} (meaningful: {})", result.log_nfa, result.meaningful);
    println!("  Selected inlier threshold: {:.3} px", result.threshold);
    println!("  Iterations used: {}", result.iterations);

    println!("\nEstimated fundamental matrix:");
    for i in 0..3 {
        println!(
            "  [{:9.5}, {:9.5}, {:9.5}]",
            result.model.f[(i, 0)],
            result.model.f[(i, 1)],
            result.model.f[(i, 2)]
        );
    }

    // Mean distance of inlier matches to their epipolar lines.
    let mut total = 0.0;
    for &idx in &result.inliers {
        let (a, b, c) = result.model.epipolar_line(points1[(idx, 0)], points1[(idx, 1)]);
        total += (a * points2[(idx, 0)] + b * points2[(idx, 1)] + c).abs()
            / (a * a + b * b).sqrt();
    }
    println!(
        "\nMean epipolar distance over inliers: {:.4} px",
        total / result.inliers.len() as f64
    );

    let correct = result.inliers.iter().filter(|&&idx| idx < n_points).count();
    println!("Correctly identified {} out of {} true inliers", correct, n_points);

    Ok(())
}
