//! Minimal-sample generation strategies.
//!
//! Two strategies cover the whole range of inputs: when the number of
//! possible minimal subsets fits in the iteration budget, every subset is
//! enumerated once in a fixed order; otherwise subsets are drawn uniformly at
//! random from a seeded generator, avoiding repeats when feasible.

pub mod exhaustive;
pub mod uniform;

pub use exhaustive::ExhaustiveSampler;
pub use uniform::UniformSampler;

use crate::core::Sampler;

/// Number of distinct minimal samples C(n, k), or `None` on overflow.
pub fn count_minimal_samples(n: usize, k: usize) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 1..=k as u128 {
        result = result.checked_mul((n as u128) - k as u128 + i)? / i;
        if result > u64::MAX as u128 {
            return None;
        }
    }
    Some(result as u64)
}

/// Choose between exhaustive enumeration and seeded random sampling.
///
/// Enumeration is used when every minimal subset can be visited within the
/// iteration budget; this makes small problems deterministic regardless of
/// the seed.
pub fn sampler_for(
    n: usize,
    sample_size: usize,
    max_iterations: usize,
    seed: Option<u64>,
) -> SamplerChoice {
    match count_minimal_samples(n, sample_size) {
        Some(total) if total <= max_iterations as u64 => {
            SamplerChoice::Exhaustive(ExhaustiveSampler::new(n, sample_size))
        }
        _ => SamplerChoice::Uniform(match seed {
            Some(seed) => UniformSampler::from_seed(n, seed),
            None => UniformSampler::new(n),
        }),
    }
}

/// Runtime selection between the built-in samplers.
pub enum SamplerChoice {
    Exhaustive(ExhaustiveSampler),
    Uniform(UniformSampler),
}

impl Sampler for SamplerChoice {
    fn sample(&mut self, sample_size: usize, out: &mut [usize]) -> bool {
        match self {
            SamplerChoice::Exhaustive(s) => s.sample(sample_size, out),
            SamplerChoice::Uniform(s) => s.sample(sample_size, out),
        }
    }

    fn exhausted(&self) -> bool {
        match self {
            SamplerChoice::Exhaustive(s) => s.exhausted(),
            SamplerChoice::Uniform(s) => s.exhausted(),
        }
    }
}
