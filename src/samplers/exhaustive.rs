//! Deterministic enumeration of every minimal subset.

use crate::core::Sampler;

/// Enumerates all C(n, k) index subsets in lexicographic order, then reports
/// exhaustion. Used when the subset universe is small enough to visit fully,
/// which makes the run deterministic regardless of any seed.
pub struct ExhaustiveSampler {
    n: usize,
    current: Vec<usize>,
    started: bool,
    done: bool,
}

impl ExhaustiveSampler {
    pub fn new(n: usize, sample_size: usize) -> Self {
        Self {
            n,
            current: Vec::with_capacity(sample_size),
            started: false,
            done: sample_size > n || sample_size == 0,
        }
    }

    /// Advance `current` to the next combination in lexicographic order.
    fn advance(&mut self) -> bool {
        let k = self.current.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.current[i] < self.n - k + i {
                self.current[i] += 1;
                for j in i + 1..k {
                    self.current[j] = self.current[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl Sampler for ExhaustiveSampler {
    fn sample(&mut self, sample_size: usize, out: &mut [usize]) -> bool {
        if self.done || out.len() < sample_size {
            return false;
        }

        if !self.started {
            self.current = (0..sample_size).collect();
            self.started = true;
        } else if !self.advance() {
            self.done = true;
            return false;
        }

        out[..sample_size].copy_from_slice(&self.current);
        true
    }

    fn exhausted(&self) -> bool {
        self.done
    }
}
