//! High-level entry points for the two built-in model types.
//!
//! These helpers assemble the correspondence matrix from two Nx2 point
//! matrices, pick a sampler appropriate for the problem size, and run the
//! estimator. Callers needing a custom kernel or sampler can use
//! [`crate::core::Orsa`] directly.

use log::debug;
use nalgebra::DMatrix;

use crate::core::{Estimation, ModelKernel, Orsa, OrsaError};
use crate::kernels::{FundamentalKernel, HomographyKernel};
use crate::models::{FundamentalMatrix, Homography};
use crate::samplers::sampler_for;
use crate::settings::OrsaSettings;
use crate::types::correspondence_matrix;

/// Estimate a homography between two images from point correspondences.
///
/// `points1` and `points2` are Nx2 matrices of matched pixel coordinates,
/// row `i` of one matching row `i` of the other. No inlier threshold is
/// needed: the NFA criterion selects the precision together with the model.
pub fn estimate_homography(
    points1: &DMatrix<f64>,
    points2: &DMatrix<f64>,
    settings: &OrsaSettings,
) -> Result<Estimation<Homography>, OrsaError> {
    let data = correspondence_matrix(points1, points2)?;
    let kernel = HomographyKernel::new(data)?;
    run_kernel(kernel, settings)
}

/// Estimate a fundamental matrix between two views from point
/// correspondences.
///
/// The returned matrix satisfies `x2^T F x1 = 0` for inlier pairs. Any
/// conversion to an essential matrix via calibration matrices is left to the
/// caller.
pub fn estimate_fundamental(
    points1: &DMatrix<f64>,
    points2: &DMatrix<f64>,
    settings: &OrsaSettings,
) -> Result<Estimation<FundamentalMatrix>, OrsaError> {
    let data = correspondence_matrix(points1, points2)?;
    let kernel = FundamentalKernel::new(data)?;
    run_kernel(kernel, settings)
}

fn run_kernel<K: ModelKernel>(
    kernel: K,
    settings: &OrsaSettings,
) -> Result<Estimation<K::Model>, OrsaError> {
    let sampler = sampler_for(
        kernel.n_data(),
        kernel.sample_size(),
        settings.max_iterations,
        settings.seed,
    );
    let mut orsa = Orsa::new(kernel, sampler, settings.clone());
    let estimation = orsa.run()?;
    debug!(
        "estimation done: {} inliers, log10(NFA)={:.3}, {} iterations",
        estimation.inliers.len(),
        estimation.log_nfa,
        estimation.iterations
    );
    Ok(estimation)
}
