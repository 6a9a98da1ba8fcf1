//! XOR Training Driver
//!
//! Trains a 2-4-1 dense/sigmoid network on the four XOR input pairs with
//! plain per-sample SGD and mean squared error — the smallest end-to-end
//! exercise of the engine's forward/backward/update cycle.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example xor
//! cargo run --release --example xor -- --epochs 2000 --lr 0.5 --seed 7
//! cargo run --release --example xor -- --predictions xor_predictions.csv
//! ```

use clap::Parser;
use cesario::{
    Dense, Layer, Loss, MSELoss, Network, PredictionWriter, RandomGenerator, Sigmoid, Tensor,
    TrainingConfig, TrainingLogger,
};

#[derive(Parser)]
#[command(name = "xor", about = "Train a 2-4-1 sigmoid network on XOR")]
struct Args {
    /// Number of passes over the four XOR pairs
    #[arg(long, default_value = "5000")]
    epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value = "1.0")]
    lr: f64,

    /// Seed for weight initialization
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Print metrics every N epochs
    #[arg(long, default_value = "500")]
    print_every: usize,

    /// Path for the per-epoch metrics CSV
    #[arg(long, default_value = "xor_training_log.csv")]
    log: String,

    /// Optional path for the (index, predicted class) export
    #[arg(long)]
    predictions: Option<String>,
}

fn xor_pairs() -> Vec<(Tensor, Tensor)> {
    [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]
        .iter()
        .map(|&(a, b)| {
            let label = if (a as i32) ^ (b as i32) == 1 { 1.0 } else { 0.0 };
            (Tensor::vector(vec![a, b]), Tensor::vector(vec![label]))
        })
        .collect()
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let config = TrainingConfig {
        learning_rate: args.lr,
        num_epochs: args.epochs,
        batch_size: 1,
        print_every: args.print_every,
    };
    println!(
        "Training XOR with configuration:\n{}",
        config.to_json().expect("config serializes")
    );

    let mut rng = RandomGenerator::from_seed(args.seed);
    let mut net = Network::new(
        vec![
            Layer::Dense(Dense::new(2, 4, "xavier", &mut rng)),
            Layer::Sigmoid(Sigmoid::new(4)),
            Layer::Dense(Dense::new(4, 1, "xavier", &mut rng)),
            Layer::Sigmoid(Sigmoid::new(1)),
        ],
        Loss::Mse(MSELoss::new()),
    );

    let pairs = xor_pairs();
    let mut logger = TrainingLogger::new(&args.log)?;

    for epoch in 1..=config.num_epochs {
        let mut epoch_loss = 0.0;
        for (x, label) in &pairs {
            epoch_loss += net.train_sample(x, label);
            net.update_parameters(config.batch_size, config.learning_rate);
        }

        if epoch % config.print_every == 0 || epoch == config.num_epochs {
            let correct = pairs
                .iter()
                .filter(|(x, label)| {
                    (net.predict(x).data[0] > 0.5) == (label.data[0] > 0.5)
                })
                .count();
            logger.log(
                epoch,
                epoch_loss / pairs.len() as f64,
                correct as f64 / pairs.len() as f64,
            )?;
        }
    }

    println!("\nFinal predictions:");
    for (x, label) in &pairs {
        let out = net.predict(x);
        println!(
            "{} XOR {} = {:.4} ~ {}",
            x.data[0] as i32, x.data[1] as i32, out.data[0], label.data[0] as i32
        );
    }

    if let Some(path) = args.predictions {
        // Two-column export: threshold at 0.5 picks the predicted class
        let mut writer = PredictionWriter::new(&path)?;
        for (i, (x, _)) in pairs.iter().enumerate() {
            let class = usize::from(net.predict(x).data[0] > 0.5);
            writer.write(i, class)?;
        }
        writer.flush()?;
        println!("Wrote predictions to {}", path);
    }

    Ok(())
}
