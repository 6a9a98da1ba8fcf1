//! Convolutional Classifier Driver
//!
//! Exercises the full convolutional chain — Conv2D, ReLU, MaxPooling,
//! Dropout, Dense, Softmax, cross-entropy — on a synthetic "digits"
//! problem: each class is a fixed random 8x8 template, and examples are
//! noisy copies of their class template. Dataset parsing belongs to the
//! caller in real use; synthesizing inputs keeps the demo self-contained.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example digits
//! cargo run --release --example digits -- --epochs 20 --noise 0.5
//! cargo run --release --example digits -- --predictions digit_predictions.csv
//! ```

use clap::Parser;
use cesario::{
    Conv2D, CrossEntropyLoss, Dense, Dropout, DropoutMode, Layer, Loss, MaxPooling, Network,
    PredictionWriter, RandomGenerator, ReLU, Softmax, Tensor, TrainingLogger,
};

const IMAGE_SIZE: usize = 8;
const NUM_CLASSES: usize = 4;

#[derive(Parser)]
#[command(
    name = "digits",
    about = "Train a small convolutional classifier on synthetic images"
)]
struct Args {
    /// Number of passes over the training set
    #[arg(long, default_value = "15")]
    epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value = "0.05")]
    lr: f64,

    /// Examples per minibatch
    #[arg(long, default_value = "8")]
    batch_size: usize,

    /// Training examples per class
    #[arg(long, default_value = "40")]
    per_class: usize,

    /// Noise amplitude added to each class template
    #[arg(long, default_value = "0.3")]
    noise: f64,

    /// Seed for templates, noise, weights, and dropout
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Path for the per-epoch metrics CSV
    #[arg(long, default_value = "digits_training_log.csv")]
    log: String,

    /// Optional path for the (index, predicted class) export
    #[arg(long)]
    predictions: Option<String>,
}

/// Noisy copies of per-class templates, labels one-hot
fn synthesize(
    per_class: usize,
    noise: f64,
    rng: &mut RandomGenerator,
) -> Vec<(Tensor, Tensor)> {
    let templates: Vec<Tensor> = (0..NUM_CLASSES)
        .map(|_| {
            let data = (0..IMAGE_SIZE * IMAGE_SIZE)
                .map(|_| rng.std_normal())
                .collect();
            Tensor::new(data, vec![IMAGE_SIZE, IMAGE_SIZE, 1])
        })
        .collect();

    let mut examples = Vec::with_capacity(NUM_CLASSES * per_class);
    for (class, template) in templates.iter().enumerate() {
        for _ in 0..per_class {
            let image = template
                .data
                .iter()
                .map(|&v| v + noise * rng.std_normal())
                .collect();
            let mut label = vec![0.0; NUM_CLASSES];
            label[class] = 1.0;
            examples.push((
                Tensor::new(image, vec![IMAGE_SIZE, IMAGE_SIZE, 1]),
                Tensor::vector(label),
            ));
        }
    }
    examples
}

fn accuracy(net: &mut Network, examples: &[(Tensor, Tensor)]) -> f64 {
    let correct = examples
        .iter()
        .filter(|(x, label)| net.predict_class(x) == label.argmax())
        .count();
    correct as f64 / examples.len() as f64
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let mut rng = RandomGenerator::from_seed(args.seed);

    // 8x8x1 → conv 3x3 stride 1 → 6x6x4 → pool 2x2 stride 2 → 3x3x4
    // → dropout → dense 36→4 → softmax
    let num_filters = 4;
    let pooled = 3 * 3 * num_filters;
    let mut net = Network::new(
        vec![
            Layer::Conv2D(Conv2D::new(
                IMAGE_SIZE, IMAGE_SIZE, 1, 3, 3, 1, 1, num_filters, "he", &mut rng,
            )),
            Layer::ReLU(ReLU::new(6, 6, num_filters)),
            Layer::MaxPooling(MaxPooling::new(6, 6, num_filters, 2, 2, 2, 2)),
            Layer::Dropout(Dropout::new(0.8, RandomGenerator::from_seed(args.seed + 1))),
            Layer::Dense(Dense::new(pooled, NUM_CLASSES, "xavier", &mut rng)),
            Layer::Softmax(Softmax::new(NUM_CLASSES)),
        ],
        Loss::CrossEntropy(CrossEntropyLoss::new(NUM_CLASSES)),
    );

    let examples = synthesize(args.per_class, args.noise, &mut rng);
    let mut logger = TrainingLogger::new(&args.log)?;

    for epoch in 1..=args.epochs {
        net.set_dropout_mode(DropoutMode::Train);
        let mut epoch_loss = 0.0;

        for batch in examples.chunks(args.batch_size) {
            for (x, label) in batch {
                epoch_loss += net.train_sample(x, label);
            }
            net.update_parameters(batch.len(), args.lr);
        }

        net.set_dropout_mode(DropoutMode::Test);
        logger.log(
            epoch,
            epoch_loss / examples.len() as f64,
            accuracy(&mut net, &examples),
        )?;
    }

    if let Some(path) = args.predictions {
        net.set_dropout_mode(DropoutMode::Test);
        let mut writer = PredictionWriter::new(&path)?;
        for (i, (x, _)) in examples.iter().enumerate() {
            writer.write(i, net.predict_class(x))?;
        }
        writer.flush()?;
        println!("Wrote predictions to {}", path);
    }

    Ok(())
}
