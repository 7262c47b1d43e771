//! Seeded uniform random sampling of minimal subsets.

use std::collections::HashSet;

use crate::core::Sampler;
use crate::utils::UniformRandomGenerator;

/// How many fresh draws to try before accepting an already-seen subset.
const MAX_REDRAWS: usize = 32;

/// Draws index subsets uniformly without replacement within a subset, from a
/// seedable generator. Already-emitted subsets are remembered and redrawn a
/// bounded number of times, so small runs rarely waste iterations on repeats.
pub struct UniformSampler {
    n: usize,
    rng: UniformRandomGenerator<usize>,
    seen: HashSet<Vec<usize>>,
}

impl UniformSampler {
    /// Sampler seeded from entropy.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            rng: UniformRandomGenerator::new(),
            seen: HashSet::new(),
        }
    }

    /// Sampler with a fixed seed; identical seeds reproduce identical draws.
    pub fn from_seed(n: usize, seed: u64) -> Self {
        Self {
            n,
            rng: UniformRandomGenerator::from_seed(seed),
            seen: HashSet::new(),
        }
    }
}

impl Sampler for UniformSampler {
    fn sample(&mut self, sample_size: usize, out: &mut [usize]) -> bool {
        if sample_size == 0 || sample_size > self.n || out.len() < sample_size {
            return false;
        }

        for _ in 0..MAX_REDRAWS {
            self.rng
                .gen_unique(&mut out[..sample_size], 0, self.n - 1);
            let mut key = out[..sample_size].to_vec();
            key.sort_unstable();
            if self.seen.insert(key) {
                return true;
            }
        }

        // Subset space nearly spent; accept the repeat rather than stall.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_unique_indices_in_range() {
        let mut sampler = UniformSampler::from_seed(20, 99);
        let mut out = [0usize; 4];

        for _ in 0..50 {
            assert!(sampler.sample(4, &mut out));
            assert!(out.iter().all(|&i| i < 20));
            for i in 0..out.len() {
                for j in (i + 1)..out.len() {
                    assert_ne!(out[i], out[j]);
                }
            }
        }
    }

    #[test]
    fn same_seed_reproduces_draws() {
        let mut a = UniformSampler::from_seed(50, 7);
        let mut b = UniformSampler::from_seed(50, 7);
        let mut out_a = [0usize; 4];
        let mut out_b = [0usize; 4];

        for _ in 0..20 {
            assert!(a.sample(4, &mut out_a));
            assert!(b.sample(4, &mut out_b));
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn avoids_repeating_subsets_when_room_remains() {
        let mut sampler = UniformSampler::from_seed(10, 3);
        let mut out = [0usize; 2];
        let mut keys = HashSet::new();

        // C(10,2) = 45 subsets; 30 draws should all be distinct.
        for _ in 0..30 {
            assert!(sampler.sample(2, &mut out));
            let mut key = out.to_vec();
            key.sort_unstable();
            assert!(keys.insert(key), "subset repeated too early");
        }
    }

    #[test]
    fn rejects_oversized_requests() {
        let mut sampler = UniformSampler::from_seed(3, 1);
        let mut out = [0usize; 4];
        assert!(!sampler.sample(4, &mut out));
    }
}
