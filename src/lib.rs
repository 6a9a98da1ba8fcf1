//! Cesario: Educational Neural Network Training Engine
//!
//! A minimal, from-scratch training engine implemented in Rust for
//! educational purposes: layer primitives and loss functions, each with a
//! manual forward pass and a matching hand-derived backward pass, plus
//! per-parameter gradient accumulation for minibatch SGD. Named after
//! Viola's quick-witted disguise from *Twelfth Night*.
//!
//! # Modules
//!
//! - [`tensor`] - Flat `f64` vector/cube storage with shape checking
//! - [`rng`] - Injectable, seedable random sampling
//! - [`init`] - Weight initialization schemes (xavier, he, small_rand)
//! - [`layers`] - Dense, Conv2D, MaxPooling, Dropout, ReLU, Sigmoid, Softmax
//! - [`losses`] - Cross-entropy and mean squared error
//! - [`network`] - Ordered layer chain + loss composition
//! - [`config`] - Training hyperparameters with JSON round-tripping
//! - [`logger`] - CSV metrics logging and prediction export
//!
//! # Example
//!
//! ```rust
//! use cesario::{Dense, Layer, Loss, MSELoss, Network, RandomGenerator, Sigmoid, Tensor};
//!
//! // A 2-4-1 sigmoid network with reproducible initialization
//! let mut rng = RandomGenerator::from_seed(42);
//! let mut net = Network::new(
//!     vec![
//!         Layer::Dense(Dense::new(2, 4, "xavier", &mut rng)),
//!         Layer::Sigmoid(Sigmoid::new(4)),
//!         Layer::Dense(Dense::new(4, 1, "xavier", &mut rng)),
//!         Layer::Sigmoid(Sigmoid::new(1)),
//!     ],
//!     Loss::Mse(MSELoss::new()),
//! );
//!
//! // One SGD step on one example
//! let loss = net.train_sample(
//!     &Tensor::vector(vec![0.0, 1.0]),
//!     &Tensor::vector(vec![1.0]),
//! );
//! net.update_parameters(1, 1.0);
//! assert!(loss.is_finite());
//! ```

pub mod config;
pub mod init;
pub mod layers;
pub mod logger;
pub mod losses;
pub mod network;
pub mod rng;
pub mod tensor;

// Re-export main types for convenience
pub use config::TrainingConfig;
pub use init::{InitScheme, WeightInitializer};
pub use layers::{Conv2D, Dense, Dropout, DropoutMode, Layer, MaxPooling, ReLU, Sigmoid, Softmax};
pub use logger::{PredictionWriter, TrainingLogger};
pub use losses::{CrossEntropyLoss, Loss, MSELoss};
pub use network::Network;
pub use rng::RandomGenerator;
pub use tensor::Tensor;
