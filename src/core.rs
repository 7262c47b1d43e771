//! Core traits and the ORSA estimation loop.
//!
//! The estimator is assembled from three pluggable pieces:
//! - a [`ModelKernel`] that knows how to turn minimal samples into candidate
//!   models and how to measure per-correspondence errors,
//! - a [`Sampler`] that produces minimal index subsets,
//! - a [`TerminationCriterion`] that may shrink the iteration budget once a
//!   meaningful model has been found.
//!
//! Scoring is fixed to the a-contrario NFA criterion from [`crate::scoring`]:
//! instead of a caller-supplied inlier threshold, each candidate model is
//! scored over every prefix of its sorted error vector and the most
//! significant prefix wins.

use log::{debug, warn};
use thiserror::Error;

use crate::scoring::{NfaScore, NfaScorer};
use crate::settings::OrsaSettings;

/// Image in which a residual was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Index into per-image arrays (priors, log tables).
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Squared residual of one correspondence under a model, tagged with the
/// image the distance lives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointError {
    pub value: f64,
    pub side: Side,
}

/// Geometry of the residual: distance to a point (homography transfer error)
/// or distance to a line (epipolar distance). Determines the exponent of the
/// error in the NFA null-probability term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceKind {
    Point,
    Line,
}

/// Model kernel: everything the estimator needs to know about one geometric
/// model type. Implementations capture the correspondence set at construction
/// and are pure functions of it afterwards.
pub trait ModelKernel {
    /// Model type produced by this kernel.
    type Model: Clone;

    /// Number of correspondences captured at construction.
    fn n_data(&self) -> usize;

    /// Size of a minimal sample.
    fn sample_size(&self) -> usize;

    /// Maximum number of algebraic solutions a minimal sample can yield.
    fn models_per_sample(&self) -> usize;

    /// Whether errors are point distances or line distances.
    fn distance_kind(&self) -> DistanceKind;

    /// Candidate models from a minimal sample of `sample_size()` indices.
    ///
    /// A degenerate sample (collinear points, rank-deficient system) yields
    /// an empty vector; this is not an error.
    fn compute_models(&self, sample: &[usize]) -> Vec<Self::Model>;

    /// Squared residual of correspondence `index` under `model`.
    fn error(&self, model: &Self::Model, index: usize) -> PointError;

    /// Least-squares refit over an arbitrary index subset. Returns `None`
    /// when the subset is too small or the system is singular.
    fn refit(&self, inliers: &[usize]) -> Option<Self::Model>;
}

/// Sampler producing minimal index subsets over `[0, n)`.
pub trait Sampler {
    /// Fill `out` with a minimal sample. Returns `false` when no sample could
    /// be produced this call; check [`Sampler::exhausted`] to distinguish a
    /// transient failure from the end of a finite enumeration.
    fn sample(&mut self, sample_size: usize, out: &mut [usize]) -> bool;

    /// `true` once a finite enumeration has emitted every subset.
    fn exhausted(&self) -> bool {
        false
    }
}

/// Criterion that may shrink the remaining iteration budget after a new best
/// model has been accepted.
pub trait TerminationCriterion {
    /// Update `max_iterations` given the current best score and the iteration
    /// it was found at. Returns `true` to request immediate termination.
    fn check(
        &mut self,
        n_data: usize,
        best: &NfaScore,
        sample_size: usize,
        iteration: usize,
        max_iterations: &mut usize,
    ) -> bool;
}

/// RANSAC-style budget shrinkage driven by the inlier count of the best NFA
/// score: `N = log(1 - confidence) / log(1 - ratio^sample_size)`.
///
/// The NFA-selected threshold of an early best can be loose, inflating the
/// inlier count and with it the shrinkage, so the cap never drops below
/// `reserve` iterations past the improvement that triggered it.
pub struct NfaTerminationCriterion {
    /// Desired confidence in `(0, 1)`.
    pub confidence: f64,
    /// Minimum number of iterations kept after any shrink.
    pub reserve: usize,
}

impl TerminationCriterion for NfaTerminationCriterion {
    fn check(
        &mut self,
        n_data: usize,
        best: &NfaScore,
        sample_size: usize,
        iteration: usize,
        max_iterations: &mut usize,
    ) -> bool {
        let n = n_data as f64;
        if n <= 0.0 {
            return false;
        }

        let inlier_ratio = (best.inlier_count as f64 / n).clamp(0.0, 1.0);
        if inlier_ratio <= 0.0 || inlier_ratio >= 1.0 {
            return false;
        }

        let p_good_sample = inlier_ratio.powi(sample_size as i32);
        if p_good_sample <= 0.0 || p_good_sample >= 1.0 {
            return false;
        }

        let log_one_minus_conf = (1.0 - self.confidence).ln();
        let log_one_minus_p = (1.0 - p_good_sample).ln();
        if !log_one_minus_conf.is_finite() || !log_one_minus_p.is_finite() {
            return false;
        }

        let required = (log_one_minus_conf / log_one_minus_p).ceil().max(1.0) as usize;
        let required = required.max(iteration + 1 + self.reserve);
        if required < *max_iterations {
            debug!(
                "budget shrunk to {} iterations (inlier ratio {:.3})",
                required, inlier_ratio
            );
            *max_iterations = required;
        }

        // Never force an immediate stop; the loop exits once the (possibly
        // reduced) budget is spent.
        false
    }
}

/// Errors reported by kernel construction and by the estimation loop.
#[derive(Debug, Error)]
pub enum OrsaError {
    #[error("need at least {needed} correspondences, got {got}")]
    InsufficientCorrespondences { got: usize, needed: usize },
    #[error("correspondence matrix must have 4 columns, got {0}")]
    BadDataShape(usize),
    #[error("points1 and points2 must both be Nx2 with the same N")]
    PointShapeMismatch,
    #[error("iteration cap must be positive")]
    InvalidIterationCap,
    #[error("confidence must lie in (0, 1)")]
    InvalidConfidence,
    #[error("precision priors must be positive")]
    InvalidPrecision,
    #[error("no valid model found within {0} iterations")]
    NoValidModel(usize),
}

/// Outcome of a successful estimation run.
#[derive(Debug, Clone)]
pub struct Estimation<M> {
    /// Best model, refit over the inlier set when refinement is enabled.
    pub model: M,
    /// Indices of the inliers, ordered by increasing error.
    pub inliers: Vec<usize>,
    /// Base-10 logarithm of the achieved NFA; lower is better.
    pub log_nfa: f64,
    /// Error of the last accepted inlier, as a distance (not squared).
    pub threshold: f64,
    /// Image in which the threshold was measured.
    pub side: Side,
    /// `true` when the NFA is below 1, i.e. fewer than one false detection
    /// is expected by chance. The best candidate is returned either way.
    pub meaningful: bool,
    /// Number of sampling iterations consumed.
    pub iterations: usize,
}

struct BestRecord<M> {
    model: M,
    score: NfaScore,
    inliers: Vec<usize>,
}

/// Sampling attempts allowed per iteration before the iteration is counted
/// as unproductive.
const MAX_SAMPLE_ATTEMPTS: usize = 100;

/// ORSA estimator: the sample / score / keep-best loop.
pub struct Orsa<K, Sa, T = NfaTerminationCriterion>
where
    K: ModelKernel,
    Sa: Sampler,
    T: TerminationCriterion,
{
    settings: OrsaSettings,
    kernel: K,
    sampler: Sa,
    termination: T,
}

impl<K, Sa> Orsa<K, Sa, NfaTerminationCriterion>
where
    K: ModelKernel,
    Sa: Sampler,
{
    /// Create an estimator with the default budget-shrinkage criterion. The
    /// shrinkage reserve is a tenth of the iteration cap.
    pub fn new(kernel: K, sampler: Sa, settings: OrsaSettings) -> Self {
        let termination = NfaTerminationCriterion {
            confidence: settings.confidence,
            reserve: (settings.max_iterations / 10).max(1),
        };
        Self {
            settings,
            kernel,
            sampler,
            termination,
        }
    }
}

impl<K, Sa, T> Orsa<K, Sa, T>
where
    K: ModelKernel,
    Sa: Sampler,
    T: TerminationCriterion,
{
    /// Create an estimator with a custom termination criterion.
    pub fn with_termination(kernel: K, sampler: Sa, settings: OrsaSettings, termination: T) -> Self {
        Self {
            settings,
            kernel,
            sampler,
            termination,
        }
    }

    /// Access the kernel, e.g. for refitting outside the loop.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Run the estimation loop to completion.
    ///
    /// Degenerate samples are skipped; the run fails only when the input is
    /// too small, the configuration is invalid, or the whole budget passes
    /// without a single scored candidate.
    pub fn run(&mut self) -> Result<Estimation<K::Model>, OrsaError> {
        let n = self.kernel.n_data();
        let sample_size = self.kernel.sample_size();

        if n < sample_size {
            return Err(OrsaError::InsufficientCorrespondences {
                got: n,
                needed: sample_size,
            });
        }
        if self.settings.max_iterations == 0 {
            return Err(OrsaError::InvalidIterationCap);
        }
        if self.settings.confidence <= 0.0 || self.settings.confidence >= 1.0 {
            return Err(OrsaError::InvalidConfidence);
        }
        if self.settings.alpha0_left <= 0.0 || self.settings.alpha0_right <= 0.0 {
            return Err(OrsaError::InvalidPrecision);
        }

        let scorer = NfaScorer::new(
            n,
            sample_size,
            self.kernel.models_per_sample(),
            self.settings.logalpha0(),
            self.kernel.distance_kind(),
        );

        let mut max_iterations = self.settings.max_iterations;
        let mut iteration = 0usize;
        let mut sample = vec![0usize; sample_size];
        let mut errors: Vec<PointError> = Vec::with_capacity(n);
        let mut inlier_buf: Vec<usize> = Vec::new();
        let mut best: Option<BestRecord<K::Model>> = None;

        'sampling: while iteration < max_iterations {
            // Obtain a non-degenerate sample, retrying a bounded number of
            // times. A finite enumeration signals exhaustion and ends the run.
            let mut models: Vec<K::Model> = Vec::new();
            for _ in 0..MAX_SAMPLE_ATTEMPTS {
                if !self.sampler.sample(sample_size, &mut sample) {
                    if self.sampler.exhausted() {
                        break 'sampling;
                    }
                    continue;
                }
                models = self.kernel.compute_models(&sample);
                if !models.is_empty() {
                    break;
                }
            }
            if models.is_empty() {
                iteration += 1;
                continue;
            }

            for model in &models {
                errors.clear();
                errors.extend((0..n).map(|i| self.kernel.error(model, i)));

                let score = match scorer.score(&errors, &mut inlier_buf) {
                    Some(score) => score,
                    None => continue,
                };

                let improved = match &best {
                    None => true,
                    Some(b) => score.log_nfa < b.score.log_nfa,
                };
                if improved {
                    debug!(
                        "iteration {}: new best log10(NFA)={:.3}, {} inliers",
                        iteration, score.log_nfa, score.inlier_count
                    );
                    if score.is_meaningful() {
                        self.termination
                            .check(n, &score, sample_size, iteration, &mut max_iterations);
                    }
                    best = Some(BestRecord {
                        model: model.clone(),
                        score,
                        inliers: inlier_buf.clone(),
                    });
                }
            }

            iteration += 1;
        }

        let mut best = match best {
            Some(best) => best,
            None => {
                warn!("no valid model after {} iterations", iteration);
                return Err(OrsaError::NoValidModel(iteration));
            }
        };

        if self.settings.refine {
            if let Some(refined) = self.kernel.refit(&best.inliers) {
                best.model = refined;
            }
        }

        Ok(Estimation {
            model: best.model,
            inliers: best.inliers,
            log_nfa: best.score.log_nfa,
            threshold: best.score.threshold_sq.max(0.0).sqrt(),
            side: best.score.side,
            meaningful: best.score.is_meaningful(),
            iterations: iteration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samplers::ExhaustiveSampler;

    /// Kernel over scalar "correspondences": a model is a center value, the
    /// error is the squared distance to it. Minimal sample size 2, model =
    /// midpoint of the sample.
    struct MidpointKernel {
        values: Vec<f64>,
    }

    impl ModelKernel for MidpointKernel {
        type Model = f64;

        fn n_data(&self) -> usize {
            self.values.len()
        }

        fn sample_size(&self) -> usize {
            2
        }

        fn models_per_sample(&self) -> usize {
            1
        }

        fn distance_kind(&self) -> DistanceKind {
            DistanceKind::Point
        }

        fn compute_models(&self, sample: &[usize]) -> Vec<f64> {
            let a = self.values[sample[0]];
            let b = self.values[sample[1]];
            // Samples spanning more than one unit are "degenerate".
            if (a - b).abs() > 1.0 {
                return Vec::new();
            }
            vec![(a + b) / 2.0]
        }

        fn error(&self, model: &f64, index: usize) -> PointError {
            let d = self.values[index] - model;
            PointError {
                value: d * d,
                side: Side::Right,
            }
        }

        fn refit(&self, inliers: &[usize]) -> Option<f64> {
            if inliers.is_empty() {
                return None;
            }
            let sum: f64 = inliers.iter().map(|&i| self.values[i]).sum();
            Some(sum / inliers.len() as f64)
        }
    }

    fn clustered_kernel() -> MidpointKernel {
        // Tight cluster around 0 plus two gross outliers.
        MidpointKernel {
            values: vec![0.0, 0.01, -0.01, 0.02, -0.02, 0.005, 40.0, -35.0],
        }
    }

    #[test]
    fn finds_cluster_and_rejects_outliers() {
        let kernel = clustered_kernel();
        let n = kernel.n_data();
        let sampler = ExhaustiveSampler::new(n, 2);
        let settings = OrsaSettings {
            max_iterations: 100,
            ..OrsaSettings::default()
        };

        let mut orsa = Orsa::new(kernel, sampler, settings);
        let estimation = orsa.run().expect("estimation should succeed");

        let mut inliers = estimation.inliers.clone();
        inliers.sort_unstable();
        assert_eq!(inliers, vec![0, 1, 2, 3, 4, 5]);
        assert!(estimation.meaningful);
        assert!(estimation.model.abs() < 0.05);
    }

    #[test]
    fn too_few_correspondences_is_fatal() {
        let kernel = MidpointKernel { values: vec![1.0] };
        let sampler = ExhaustiveSampler::new(1, 2);
        let mut orsa = Orsa::new(kernel, sampler, OrsaSettings::default());

        match orsa.run() {
            Err(OrsaError::InsufficientCorrespondences { got, needed }) => {
                assert_eq!(got, 1);
                assert_eq!(needed, 2);
            }
            other => panic!("expected InsufficientCorrespondences, got {:?}", other.err()),
        }
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let kernel = clustered_kernel();
        let n = kernel.n_data();
        let sampler = ExhaustiveSampler::new(n, 2);
        let settings = OrsaSettings {
            max_iterations: 0,
            ..OrsaSettings::default()
        };
        let mut orsa = Orsa::new(kernel, sampler, settings);
        assert!(matches!(orsa.run(), Err(OrsaError::InvalidIterationCap)));
    }

    #[test]
    fn all_degenerate_samples_reports_no_model() {
        // Every pair spans more than one unit, so no sample yields a model.
        let kernel = MidpointKernel {
            values: vec![0.0, 10.0, 20.0, 30.0],
        };
        let sampler = ExhaustiveSampler::new(4, 2);
        let settings = OrsaSettings {
            max_iterations: 50,
            ..OrsaSettings::default()
        };
        let mut orsa = Orsa::new(kernel, sampler, settings);
        assert!(matches!(orsa.run(), Err(OrsaError::NoValidModel(_))));
    }

    #[test]
    fn termination_criterion_shrinks_budget() {
        let mut criterion = NfaTerminationCriterion {
            confidence: 0.99,
            reserve: 10,
        };
        let score = NfaScore {
            log_nfa: -10.0,
            inlier_count: 90,
            threshold_sq: 0.01,
            side: Side::Right,
        };
        let mut max_iterations = 100_000;
        criterion.check(100, &score, 4, 0, &mut max_iterations);
        assert!(max_iterations < 100_000);
        assert!(max_iterations >= 1);
    }

    #[test]
    fn shrinkage_keeps_a_reserve_past_an_early_loose_best() {
        // A loose first best can claim nearly every correspondence; the
        // formula alone would collapse the budget to a handful of iterations
        // before a clean sample has any chance of being drawn.
        let mut criterion = NfaTerminationCriterion {
            confidence: 0.99,
            reserve: 100,
        };
        let score = NfaScore {
            log_nfa: -3.0,
            inlier_count: 19,
            threshold_sq: 4.3,
            side: Side::Right,
        };
        let mut max_iterations = 1000;
        criterion.check(20, &score, 7, 3, &mut max_iterations);
        assert!(max_iterations >= 3 + 1 + 100);
        assert!(max_iterations < 1000);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let kernel = clustered_kernel();
        let n = kernel.n_data();
        let sampler = ExhaustiveSampler::new(n, 2);
        let settings = OrsaSettings {
            confidence: 1.5,
            ..OrsaSettings::default()
        };
        let mut orsa = Orsa::new(kernel, sampler, settings);
        assert!(matches!(orsa.run(), Err(OrsaError::InvalidConfidence)));
    }
}
