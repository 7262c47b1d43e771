//! Configuration for an ORSA estimation run.

/// Settings controlling the sampling loop and the a-contrario score.
///
/// Unlike threshold-based RANSAC configurations there is no inlier distance
/// here: the precision of the fit is chosen per candidate model by the NFA
/// scorer. The two `alpha0` values are the angular precision priors of the
/// null model, one per image.
#[derive(Debug, Clone, PartialEq)]
pub struct OrsaSettings {
    /// Hard cap on sampling iterations. Must be positive.
    pub max_iterations: usize,
    /// Confidence level in `(0, 1)` used to shrink the remaining budget once
    /// a meaningful model has been found.
    pub confidence: f64,
    /// Angular precision prior of the null model in the left image.
    pub alpha0_left: f64,
    /// Angular precision prior of the null model in the right image.
    pub alpha0_right: f64,
    /// Seed for the randomized sampler. `None` seeds from entropy; identical
    /// seeds reproduce identical runs.
    pub seed: Option<u64>,
    /// Refit the model on the final inlier set before returning.
    pub refine: bool,
}

impl Default for OrsaSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            confidence: 0.99,
            alpha0_left: std::f64::consts::PI / 36.0,
            alpha0_right: std::f64::consts::PI / 36.0,
            seed: None,
            refine: true,
        }
    }
}

impl OrsaSettings {
    /// Base-10 logarithms of the two precision priors, indexed by side.
    pub(crate) fn logalpha0(&self) -> [f64; 2] {
        [self.alpha0_left.log10(), self.alpha0_right.log10()]
    }
}
