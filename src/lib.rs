//! # orsa — parameter-free robust two-view geometry estimation
//!
//! `orsa` estimates a homography or a fundamental matrix from 2D point
//! correspondences contaminated by mismatches, using the a-contrario ORSA
//! criterion: instead of a caller-supplied inlier distance threshold, each
//! candidate model is scored by its number of false alarms (NFA) over every
//! prefix of its sorted error vector, so the model, its inlier set and the
//! precision of the fit are selected together.
//!
//! ## Quick start
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use orsa::{estimate_homography, OrsaSettings};
//!
//! // Matched points: (x, y) -> (x + 1, y + 2), one row per correspondence.
//! let mut p1 = DMatrix::<f64>::zeros(12, 2);
//! let mut p2 = DMatrix::<f64>::zeros(12, 2);
//! for i in 0..12 {
//!     let (x, y) = ((i % 4) as f64, (i / 4) as f64);
//!     p1[(i, 0)] = x;
//!     p1[(i, 1)] = y;
//!     p2[(i, 0)] = x + 1.0;
//!     p2[(i, 1)] = y + 2.0;
//! }
//!
//! let settings = OrsaSettings {
//!     seed: Some(0),
//!     ..OrsaSettings::default()
//! };
//! let estimation = estimate_homography(&p1, &p2, &settings).unwrap();
//! assert_eq!(estimation.inliers.len(), 12);
//! ```
//!
//! ## Extending
//!
//! The estimation loop is generic over two traits:
//!
//! - [`ModelKernel`](core::ModelKernel): minimal solver, per-correspondence
//!   error and least-squares refit for one geometric model type;
//! - [`Sampler`](core::Sampler): generation of minimal index subsets.
//!
//! Implementing `ModelKernel` for a new model type is enough to reuse the
//! whole sampling/scoring machinery; see [`kernels::HomographyKernel`] and
//! [`kernels::FundamentalKernel`] for the two built-in instances.
//!
//! ## Modules
//!
//! - [`api`]: high-level estimation functions
//! - [`core`]: traits, the `Orsa` loop, errors and results
//! - [`scoring`]: the NFA scorer
//! - [`samplers`]: exhaustive and seeded-random samplers
//! - [`kernels`]: homography and fundamental-matrix kernels
//! - [`models`]: geometric model types
//! - [`settings`]: run configuration

pub mod api;
pub mod core;
pub mod kernels;
pub mod models;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

pub use api::{estimate_fundamental, estimate_homography};
pub use core::{
    DistanceKind, Estimation, ModelKernel, Orsa, OrsaError, PointError, Sampler, Side,
    TerminationCriterion,
};
pub use models::{FundamentalMatrix, Homography};
pub use scoring::{NfaScore, NfaScorer};
pub use settings::OrsaSettings;
pub use types::{correspondence_matrix, DataMatrix};
