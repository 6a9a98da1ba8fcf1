//! Random Sampling Service
//!
//! Every component in the engine that needs randomness (weight
//! initialization, dropout masks) draws from an explicit `RandomGenerator`
//! handle instead of a hidden process-wide stream. This keeps tests
//! deterministic: construct the generator with a seed and every sample is
//! reproducible.
//!
//! ## Ownership
//!
//! A generator is a single mutable stream. It is never reseeded during a
//! run. It is deliberately not `Sync`: concurrent sampling from multiple
//! threads must either be externally synchronized or, better, each thread
//! gets its own instance (e.g. `from_seed(base + thread_id)`).
//!
//! ## Example
//!
//! ```rust
//! use cesario::RandomGenerator;
//!
//! let mut a = RandomGenerator::from_seed(42);
//! let mut b = RandomGenerator::from_seed(42);
//! assert_eq!(a.std_normal(), b.std_normal());
//!
//! let u = a.uniform(-1.0, 1.0);
//! assert!((-1.0..1.0).contains(&u));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Seedable source of normal and uniform samples
///
/// Wraps a [`StdRng`] plus a cached standard-normal distribution. All
/// sampling in a component should flow through one of these, injected at
/// construction.
pub struct RandomGenerator {
    rng: StdRng,
    std_normal: Normal<f64>,
}

impl RandomGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create a deterministic generator from a fixed seed
    ///
    /// Two generators built from the same seed produce identical sample
    /// streams, which is what the gradient-check tests rely on.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        // Unit normal parameters are always valid
        let std_normal = Normal::new(0.0, 1.0).unwrap();
        Self { rng, std_normal }
    }

    /// Sample from the standard normal distribution N(0, 1)
    pub fn std_normal(&mut self) -> f64 {
        self.std_normal.sample(&mut self.rng)
    }

    /// Sample uniformly from [0, 1)
    pub fn std_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Sample uniformly from [min, max)
    ///
    /// # Panics
    ///
    /// Panics if `min >= max`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        assert!(
            min < max,
            "Uniform range is empty: [{}, {})",
            min,
            max
        );
        self.rng.random_range(min..max)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_streams_are_reproducible() {
        let mut a = RandomGenerator::from_seed(7);
        let mut b = RandomGenerator::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.std_normal(), b.std_normal());
            assert_eq!(a.std_uniform(), b.std_uniform());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = RandomGenerator::from_seed(1);
        let mut b = RandomGenerator::from_seed(2);
        let same = (0..10).all(|_| a.std_normal() == b.std_normal());
        assert!(!same);
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut rng = RandomGenerator::from_seed(11);
        for _ in 0..1000 {
            let u = rng.std_uniform();
            assert!((0.0..1.0).contains(&u));

            let v = rng.uniform(-3.0, 5.0);
            assert!((-3.0..5.0).contains(&v));
        }
    }

    #[test]
    fn test_std_normal_moments() {
        // 10k samples should land near mean 0, std 1
        let mut rng = RandomGenerator::from_seed(99);
        let samples: Vec<f64> = (0..10_000).map(|_| rng.std_normal()).collect();
        let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        let var: f64 =
            samples.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "Sample mean {} too far from 0", mean);
        assert!((var.sqrt() - 1.0).abs() < 0.05, "Sample std {} too far from 1", var.sqrt());
    }

    #[test]
    #[should_panic(expected = "range is empty")]
    fn test_uniform_rejects_empty_range() {
        let mut rng = RandomGenerator::from_seed(0);
        rng.uniform(1.0, 1.0);
    }
}
