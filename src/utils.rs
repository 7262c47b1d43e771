//! Numeric helpers shared by the samplers and the minimal solvers.

use nalgebra::{DMatrix, DVector};
use rand::distributions::Uniform;
use rand::prelude::*;

/// Uniform integer generator over a resettable inclusive range.
///
/// Production use seeds from entropy; fixing the seed makes a whole
/// estimation run reproducible.
pub struct UniformRandomGenerator<T>
where
    T: Copy + rand::distributions::uniform::SampleUniform + PartialOrd,
{
    rng: StdRng,
    dist: Option<Uniform<T>>,
}

impl<T> UniformRandomGenerator<T>
where
    T: Copy + rand::distributions::uniform::SampleUniform + PartialOrd,
{
    /// Construct with an entropy seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            dist: None,
        }
    }

    /// Construct with a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dist: None,
        }
    }

    /// Reset the distribution range (inclusive on both ends).
    pub fn reset(&mut self, min: T, max: T) {
        self.dist = Some(Uniform::new_inclusive(min, max));
    }

    /// Draw one value from the current range; `reset` must have been called.
    fn next_value(&mut self) -> Option<T> {
        let dist = self.dist.as_ref()?;
        Some(self.rng.sample(dist))
    }

    /// Fill `out` with distinct random values in `[min, max]`.
    ///
    /// Rejection sampling, adequate for the small sample sizes of minimal
    /// solvers.
    pub fn gen_unique(&mut self, out: &mut [T], min: T, max: T)
    where
        T: Eq,
    {
        self.reset(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = match self.next_value() {
                    Some(v) => v,
                    None => return,
                };
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

impl<T> Default for UniformRandomGenerator<T>
where
    T: Copy + rand::distributions::uniform::SampleUniform + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Gaussian elimination with partial pivoting, solving `A x = b` from the
/// augmented matrix `[A | b]` (n rows, n+1 columns). Returns `false` on a
/// singular pivot, which minimal solvers treat as a degenerate sample.
pub fn gauss_elimination(augmented: &mut DMatrix<f64>, result: &mut DVector<f64>) -> bool {
    let n = augmented.nrows();
    if n + 1 != augmented.ncols() || n != result.len() {
        return false;
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[(i, i)].abs();
        for k in (i + 1)..n {
            let val = augmented[(k, i)].abs();
            if val > max_val {
                max_val = val;
                max_row = k;
            }
        }
        if max_row != i {
            augmented.swap_rows(i, max_row);
        }

        if augmented[(i, i)].abs() < 1e-10 {
            return false;
        }

        for k in (i + 1)..n {
            let factor = augmented[(k, i)] / augmented[(i, i)];
            for j in i..augmented.ncols() {
                augmented[(k, j)] -= factor * augmented[(i, j)];
            }
        }
    }

    for i in (0..n).rev() {
        result[i] = augmented[(i, n)];
        for j in (i + 1)..n {
            result[i] -= augmented[(i, j)] * result[j];
        }
        result[i] /= augmented[(i, i)];
    }

    true
}

/// Real roots of the monic cubic `x^3 + c2 x^2 + c1 x + c0 = 0`.
///
/// Returns the number of roots written into `roots` (1 or 3), each refined
/// by one Newton step.
pub fn solve_cubic_real(c2: f64, c1: f64, c0: f64, roots: &mut [f64; 3]) -> usize {
    let a = c1 - c2 * c2 / 3.0;
    let b = (2.0 * c2 * c2 * c2 - 9.0 * c2 * c1) / 27.0 + c0;
    let discriminant = b * b / 4.0 + a * a * a / 27.0;

    let n_roots = if discriminant > 0.0 {
        let c = discriminant.sqrt();
        let b_neg = -0.5 * b;
        roots[0] = (b_neg + c).cbrt() + (b_neg - c).cbrt() - c2 / 3.0;
        1
    } else {
        let c = 3.0 * b / (2.0 * a) * (-3.0 / a).sqrt();
        let d = 2.0 * (-a / 3.0).sqrt();
        let acos_c = c.clamp(-1.0, 1.0).acos();
        let two_pi_3 = 2.0 * std::f64::consts::FRAC_PI_3;
        roots[0] = d * (acos_c / 3.0).cos() - c2 / 3.0;
        roots[1] = d * (acos_c / 3.0 - two_pi_3).cos() - c2 / 3.0;
        roots[2] = d * (acos_c / 3.0 - 2.0 * two_pi_3).cos() - c2 / 3.0;
        3
    };

    for root in roots.iter_mut().take(n_roots) {
        let x = *root;
        let x2 = x * x;
        let denom = 3.0 * x2 + 2.0 * c2 * x + c1;
        if denom.abs() > 1e-30 {
            *root -= (x * x2 + c2 * x2 + c1 * x + c0) / denom;
        }
    }

    n_roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_with_same_seed() {
        let mut rng1 = UniformRandomGenerator::<u32>::from_seed(42);
        let mut rng2 = UniformRandomGenerator::<u32>::from_seed(42);

        let mut a = [0u32; 10];
        let mut b = [0u32; 10];
        rng1.gen_unique(&mut a, 0, 100);
        rng2.gen_unique(&mut b, 0, 100);

        assert_eq!(a, b);
    }

    #[test]
    fn unique_samples_within_bounds() {
        let mut rng = UniformRandomGenerator::<usize>::from_seed(1234);
        let mut buf = [0usize; 5];
        rng.gen_unique(&mut buf, 0, 10);

        assert!(buf.iter().all(|&v| v <= 10));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn gauss_solves_small_system() {
        // x + y = 3, x - y = 1 => x = 2, y = 1
        let mut aug = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 3.0, 1.0, -1.0, 1.0]);
        let mut x = DVector::zeros(2);
        assert!(gauss_elimination(&mut aug, &mut x));
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gauss_detects_singular_matrix() {
        let mut aug = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 3.0, 2.0, 2.0, 6.0]);
        let mut x = DVector::zeros(2);
        assert!(!gauss_elimination(&mut aug, &mut x));
    }

    #[test]
    fn cubic_with_three_known_roots() {
        // (x - 1)(x - 2)(x - 3) = x^3 - 6x^2 + 11x - 6
        let mut roots = [0.0; 3];
        let n = solve_cubic_real(-6.0, 11.0, -6.0, &mut roots);
        assert_eq!(n, 3);
        let mut found = roots.to_vec();
        found.sort_by(f64::total_cmp);
        for (root, expected) in found.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn cubic_with_single_real_root() {
        // x^3 + x + 1 has one real root near -0.6823
        let mut roots = [0.0; 3];
        let n = solve_cubic_real(0.0, 1.0, 1.0, &mut roots);
        assert_eq!(n, 1);
        assert!((roots[0] + 0.682_327_803_828_019).abs() < 1e-9);
    }
}
