//! Uniform random sampler drawing minimal samples without replacement.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::Sampler;
use crate::types::DataMatrix;

/// Uniform random sampler drawing minimal samples without replacement.
///
/// The random source is owned by the sampler, so each sampler (and each
/// worker in a parallel run) has its own independent state.
#[derive(Debug, Clone)]
pub struct UniformRandomSampler<R = StdRng> {
    rng: R,
}

impl Default for UniformRandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRandomSampler {
    /// Construct a new sampler seeded from the thread-local entropy source.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Construct a sampler from a fixed seed (reproducible runs and tests).
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> UniformRandomSampler<R> {
    /// Wrap an arbitrary caller-provided generator.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl<R: Rng> Sampler for UniformRandomSampler<R> {
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool {
        let n = data.nrows();
        if sample_size == 0 || n == 0 || sample_size > n || out_indices.len() < sample_size {
            return false;
        }

        let picked = rand::seq::index::sample(&mut self.rng, n, sample_size);
        for (slot, idx) in out_indices.iter_mut().zip(picked.iter()) {
            *slot = idx;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_distinct_and_in_range() {
        let data = DataMatrix::zeros(6, 4);
        let mut sampler = UniformRandomSampler::from_seed(1234);
        let mut buf = [0usize; 4];

        for _ in 0..500 {
            assert!(sampler.sample(&data, 4, &mut buf));
            assert!(buf.iter().all(|&i| i < 6));
            for i in 0..buf.len() {
                for j in (i + 1)..buf.len() {
                    assert_ne!(buf[i], buf[j]);
                }
            }
        }
    }

    #[test]
    fn exhausts_population_when_sample_equals_n() {
        let data = DataMatrix::zeros(4, 4);
        let mut sampler = UniformRandomSampler::from_seed(9);
        let mut buf = [0usize; 4];
        assert!(sampler.sample(&data, 4, &mut buf));

        let mut sorted = buf;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3]);
    }

    #[test]
    fn refuses_impossible_samples() {
        let data = DataMatrix::zeros(3, 4);
        let mut sampler = UniformRandomSampler::from_seed(1);
        let mut buf = [0usize; 4];
        assert!(!sampler.sample(&data, 4, &mut buf));
        assert!(!sampler.sample(&data, 0, &mut buf));

        let mut short = [0usize; 2];
        let bigger = DataMatrix::zeros(10, 4);
        assert!(!sampler.sample(&bigger, 4, &mut short));
    }

    #[test]
    fn deterministic_with_same_seed() {
        let data = DataMatrix::zeros(50, 4);
        let mut s1 = UniformRandomSampler::from_seed(42);
        let mut s2 = UniformRandomSampler::with_rng(StdRng::seed_from_u64(42));

        for _ in 0..20 {
            let mut a = [0usize; 4];
            let mut b = [0usize; 4];
            s1.sample(&data, 4, &mut a);
            s2.sample(&data, 4, &mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn every_index_is_eventually_drawn() {
        let data = DataMatrix::zeros(8, 4);
        let mut sampler = UniformRandomSampler::from_seed(3);
        let mut seen = [false; 8];
        let mut buf = [0usize; 4];
        for _ in 0..200 {
            sampler.sample(&data, 4, &mut buf);
            for &i in &buf {
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
