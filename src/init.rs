//! Weight Initialization Schemes
//!
//! Maps a scheme name plus the layer's fan-in to a sampling distribution for
//! fresh parameters. Three schemes are supported:
//!
//! | Scheme       | Sample                  | Typical use              |
//! |--------------|-------------------------|--------------------------|
//! | `xavier`     | N(0,1) · √(1/fan_in)    | sigmoid/softmax networks |
//! | `he`         | N(0,1) · √(2/fan_in)    | ReLU networks            |
//! | `small_rand` | N(0,1) · 0.001          | debugging, tiny nets     |
//!
//! An unknown scheme name is a configuration error and panics at
//! construction — it is never silently replaced with a default, so a typo in
//! a config can't change which network gets trained.
//!
//! ## Example
//!
//! ```rust
//! use cesario::{RandomGenerator, WeightInitializer};
//!
//! let mut rng = RandomGenerator::from_seed(42);
//! let init = WeightInitializer::new("he", 128);
//! let w = init.sample(&mut rng);
//! assert!(w.is_finite());
//! ```

use crate::rng::RandomGenerator;

/// Recognized initialization schemes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitScheme {
    Xavier,
    He,
    SmallRand,
}

impl InitScheme {
    /// Parse a scheme name
    ///
    /// # Panics
    ///
    /// Panics on an unknown name. Initializer choice is fixed architecture
    /// configuration; failing at construction beats training the wrong net.
    pub fn from_name(name: &str) -> Self {
        match name {
            "xavier" => InitScheme::Xavier,
            "he" => InitScheme::He,
            "small_rand" => InitScheme::SmallRand,
            other => panic!(
                "Unknown weight initializer {:?} (expected \"xavier\", \"he\", or \"small_rand\")",
                other
            ),
        }
    }
}

/// Stateless sampling strategy for fresh layer parameters
///
/// A pure function of (scheme, fan_in): holds no generator of its own, and
/// draws from whichever [`RandomGenerator`] the caller passes in.
pub struct WeightInitializer {
    scheme: InitScheme,
    scale: f64,
}

impl WeightInitializer {
    /// Create an initializer for the given scheme and fan-in
    ///
    /// # Arguments
    ///
    /// * `scheme` - `"xavier"`, `"he"`, or `"small_rand"`
    /// * `fan_in` - Number of inputs feeding each unit being initialized
    ///
    /// # Panics
    ///
    /// Panics on an unknown scheme name, or on `fan_in == 0` for the
    /// fan-in-scaled schemes.
    pub fn new(scheme: &str, fan_in: usize) -> Self {
        let scheme = InitScheme::from_name(scheme);
        let scale = match scheme {
            InitScheme::Xavier | InitScheme::He => {
                assert!(fan_in > 0, "Weight initializer requires fan_in > 0");
                let numerator = if scheme == InitScheme::He { 2.0 } else { 1.0 };
                (numerator / fan_in as f64).sqrt()
            }
            InitScheme::SmallRand => 0.001,
        };
        Self { scheme, scale }
    }

    /// Draw one parameter sample
    pub fn sample(&self, rng: &mut RandomGenerator) -> f64 {
        rng.std_normal() * self.scale
    }

    /// The parsed scheme this initializer uses
    pub fn scheme(&self) -> InitScheme {
        self.scheme
    }
}
