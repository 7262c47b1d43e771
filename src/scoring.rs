//! A-contrario (NFA) scoring of candidate models.
//!
//! Given the per-correspondence errors of a model, every prefix of the sorted
//! error vector is treated as a hypothetical inlier set. The number of false
//! alarms of the prefix of length `k` with largest error `e_k` is
//!
//! ```text
//! NFA(k) = m * (n - s) * C(n, k) * C(k, s) * alpha(e_k)^(k - s)
//! ```
//!
//! where `n` is the number of correspondences, `s` the minimal sample size,
//! `m` the number of models a minimal sample can yield, and `alpha(e)` the
//! probability that a random correspondence falls within error `e` under the
//! null model, weighted by a per-image precision prior. Everything is
//! accumulated in base-10 logarithms; the prefix minimizing the score wins,
//! which is what makes the estimator threshold-free.

use crate::core::{DistanceKind, PointError, Side};

/// Significance of the best prefix of a model's error vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NfaScore {
    /// Base-10 logarithm of the NFA; lower is better.
    pub log_nfa: f64,
    /// Prefix length k: number of correspondences declared inliers.
    pub inlier_count: usize,
    /// Squared error of the k-th smallest residual.
    pub threshold_sq: f64,
    /// Image in which that residual was measured.
    pub side: Side,
}

impl NfaScore {
    /// Fewer than one false detection expected by chance.
    pub fn is_meaningful(&self) -> bool {
        self.log_nfa < 0.0
    }
}

/// log10 of the binomial coefficient C(n, k).
fn logcombi(k: usize, n: usize) -> f64 {
    if k == 0 || k >= n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 0.0;
    for i in 1..=k {
        r += ((n - k + i) as f64).log10() - (i as f64).log10();
    }
    r
}

/// Table of log10 C(n, k) for k = 0..=n.
fn makelogcombi_n(n: usize) -> Vec<f64> {
    (0..=n).map(|k| logcombi(k, n)).collect()
}

/// Table of log10 C(i, k) for i = 0..=nmax, fixed k.
fn makelogcombi_k(k: usize, nmax: usize) -> Vec<f64> {
    (0..=nmax).map(|i| logcombi(k, i)).collect()
}

/// NFA scorer for a fixed correspondence count and kernel geometry.
pub struct NfaScorer {
    n: usize,
    sample_size: usize,
    /// log10 of (models per sample * number of possible inlier thresholds).
    loge0: f64,
    /// Per-image log10 precision priors, indexed by [`Side::index`].
    logalpha0: [f64; 2],
    /// Exponent applied to the squared error: 1.0 for point distances,
    /// 0.5 for line distances.
    mult_error: f64,
    logc_n: Vec<f64>,
    logc_k: Vec<f64>,
}

impl NfaScorer {
    pub fn new(
        n: usize,
        sample_size: usize,
        models_per_sample: usize,
        logalpha0: [f64; 2],
        kind: DistanceKind,
    ) -> Self {
        let tests = models_per_sample.max(1) * n.saturating_sub(sample_size).max(1);
        let mult_error = match kind {
            DistanceKind::Point => 1.0,
            DistanceKind::Line => 0.5,
        };
        Self {
            n,
            sample_size,
            loge0: (tests as f64).log10(),
            logalpha0,
            mult_error,
            logc_n: makelogcombi_n(n),
            logc_k: makelogcombi_k(sample_size, n),
        }
    }

    /// Score of a single prefix of the sorted error vector.
    ///
    /// `largest` is the squared error of the k-th smallest residual. Exposed
    /// so callers can verify that [`NfaScorer::score`] really minimizes over
    /// all prefixes. Returns `None` for untestable prefix lengths
    /// (`k <= sample_size` or `k > n`).
    pub fn log_nfa_for_k(&self, k: usize, largest: &PointError) -> Option<f64> {
        if k <= self.sample_size || k > self.n {
            return None;
        }
        // EPSILON keeps exact fits away from log(0); the min(0) clamp caps
        // the null probability at 1.
        let logalpha = (self.logalpha0[largest.side.index()]
            + self.mult_error * (largest.value + f64::EPSILON).log10())
        .min(0.0);
        Some(
            self.loge0
                + logalpha * (k - self.sample_size) as f64
                + self.logc_n[k]
                + self.logc_k[k],
        )
    }

    /// Minimize the NFA over all prefixes of the sorted error vector.
    ///
    /// On success, `inliers_out` holds the indices of the `k` smallest
    /// errors, ordered by increasing error. Returns `None` when no prefix is
    /// testable (`n <= sample_size`) or every residual is non-finite.
    pub fn score(&self, errors: &[PointError], inliers_out: &mut Vec<usize>) -> Option<NfaScore> {
        debug_assert_eq!(errors.len(), self.n);

        let mut order: Vec<usize> = (0..errors.len()).collect();
        order.sort_by(|&a, &b| errors[a].value.total_cmp(&errors[b].value));

        let mut best: Option<NfaScore> = None;
        for k in self.sample_size + 1..=self.n {
            let largest = &errors[order[k - 1]];
            if !largest.value.is_finite() {
                break;
            }
            let log_nfa = match self.log_nfa_for_k(k, largest) {
                Some(log_nfa) => log_nfa,
                None => continue,
            };
            let better = match &best {
                None => true,
                Some(b) => log_nfa < b.log_nfa,
            };
            if better {
                best = Some(NfaScore {
                    log_nfa,
                    inlier_count: k,
                    threshold_sq: largest.value,
                    side: largest.side,
                });
            }
        }

        if let Some(score) = &best {
            inliers_out.clear();
            inliers_out.extend_from_slice(&order[..score.inlier_count]);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_errors(values: &[f64]) -> Vec<PointError> {
        values
            .iter()
            .map(|&value| PointError {
                value,
                side: Side::Right,
            })
            .collect()
    }

    fn scorer(n: usize) -> NfaScorer {
        let alpha0 = std::f64::consts::PI / 36.0;
        NfaScorer::new(
            n,
            2,
            1,
            [alpha0.log10(), alpha0.log10()],
            DistanceKind::Point,
        )
    }

    #[test]
    fn picks_prefix_before_error_gap() {
        // Six near-zero errors, two gross ones: the best prefix must stop
        // right before the gap.
        let errors = point_errors(&[1e-12, 4e-12, 2e-12, 9e-12, 3e-12, 5e-12, 900.0, 2500.0]);
        let scorer = scorer(errors.len());

        let mut inliers = Vec::new();
        let score = scorer.score(&errors, &mut inliers).expect("scoreable");

        assert_eq!(score.inlier_count, 6);
        assert!(score.is_meaningful());
        assert!((score.threshold_sq - 9e-12).abs() < 1e-20);

        let mut sorted = inliers.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn score_is_minimum_over_all_prefixes() {
        let errors = point_errors(&[0.3, 0.01, 0.2, 0.05, 7.0, 0.08, 1.5, 0.02]);
        let scorer = scorer(errors.len());

        let mut inliers = Vec::new();
        let score = scorer.score(&errors, &mut inliers).expect("scoreable");

        let mut order: Vec<usize> = (0..errors.len()).collect();
        order.sort_by(|&a, &b| errors[a].value.total_cmp(&errors[b].value));
        for k in 3..=errors.len() {
            let prefix = scorer
                .log_nfa_for_k(k, &errors[order[k - 1]])
                .expect("testable prefix");
            assert!(
                score.log_nfa <= prefix + 1e-12,
                "prefix k={} scored {} below returned minimum {}",
                k,
                prefix,
                score.log_nfa
            );
        }
        assert_eq!(inliers.len(), score.inlier_count);
    }

    #[test]
    fn zero_errors_do_not_produce_infinities() {
        let errors = point_errors(&[0.0, 0.0, 0.0, 0.0, 0.0, 100.0]);
        let scorer = scorer(errors.len());

        let mut inliers = Vec::new();
        let score = scorer.score(&errors, &mut inliers).expect("scoreable");
        assert!(score.log_nfa.is_finite());
        assert_eq!(score.inlier_count, 5);
    }

    #[test]
    fn untestable_prefix_lengths_are_rejected() {
        let scorer = scorer(8);
        let error = PointError {
            value: 0.1,
            side: Side::Right,
        };
        assert!(scorer.log_nfa_for_k(0, &error).is_none());
        assert!(scorer.log_nfa_for_k(2, &error).is_none()); // k == sample_size
        assert!(scorer.log_nfa_for_k(9, &error).is_none()); // k > n
        assert!(scorer.log_nfa_for_k(3, &error).is_some());
    }

    #[test]
    fn no_testable_prefix_when_n_equals_sample_size() {
        let errors = point_errors(&[0.1, 0.2]);
        let scorer = scorer(errors.len());
        let mut inliers = Vec::new();
        assert!(scorer.score(&errors, &mut inliers).is_none());
    }

    #[test]
    fn log_binomial_tables_match_direct_computation() {
        // C(10, 3) = 120, C(7, 7) = 1, C(5, 0) = 1
        assert!((logcombi(3, 10) - 120f64.log10()).abs() < 1e-12);
        assert_eq!(logcombi(7, 7), 0.0);
        assert_eq!(logcombi(0, 5), 0.0);

        let table_n = makelogcombi_n(10);
        assert!((table_n[3] - 120f64.log10()).abs() < 1e-12);
        let table_k = makelogcombi_k(3, 10);
        assert!((table_k[10] - 120f64.log10()).abs() < 1e-12);
    }
}
