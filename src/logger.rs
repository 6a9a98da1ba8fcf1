//! Training Metrics and Prediction Export
//!
//! Two thin CSV writers for driver programs:
//!
//! - [`TrainingLogger`] appends one row per epoch (epoch, elapsed seconds,
//!   loss, accuracy) and echoes a console line, flushing after every row
//!   so a crashed run keeps its history.
//! - [`PredictionWriter`] produces the two-column export a downstream
//!   consumer expects: example index and predicted class (argmax of the
//!   final layer output), one row per example.
//!
//! Both return [`std::io::Result`] — I/O failures are the driver's to
//! handle, never a panic inside the engine.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cesario::TrainingLogger;
//!
//! let mut logger = TrainingLogger::new("training_log.csv")?;
//! logger.log(1, 0.693, 0.5)?;
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fs::File;
use std::io::Write;
use std::time::Instant;

/// Per-epoch CSV + console metrics logger
pub struct TrainingLogger {
    log_file: File,
    start_time: Instant,
}

impl TrainingLogger {
    /// Create the CSV file and write its header
    pub fn new(log_path: &str) -> std::io::Result<Self> {
        let mut log_file = File::create(log_path)?;
        writeln!(log_file, "epoch,elapsed_seconds,loss,accuracy")?;

        Ok(Self {
            log_file,
            start_time: Instant::now(),
        })
    }

    /// Log one epoch
    ///
    /// Writes the CSV row, flushes it, and prints a console summary.
    pub fn log(&mut self, epoch: usize, loss: f64, accuracy: f64) -> std::io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f64();

        writeln!(
            self.log_file,
            "{},{:.2},{:.6},{:.4}",
            epoch, elapsed, loss, accuracy
        )?;
        // Flush so nothing is lost if the run dies mid-epoch
        self.log_file.flush()?;

        println!(
            "Epoch {:5} | Time: {:7.1}s | Loss: {:.6} | Accuracy: {:.2}%",
            epoch,
            elapsed,
            loss,
            accuracy * 100.0
        );
        Ok(())
    }
}

/// Two-column (index, predicted class) CSV export
pub struct PredictionWriter {
    out_file: File,
}

impl PredictionWriter {
    /// Create the CSV file and write its header
    pub fn new(out_path: &str) -> std::io::Result<Self> {
        let mut out_file = File::create(out_path)?;
        writeln!(out_file, "index,predicted_class")?;
        Ok(Self { out_file })
    }

    /// Append one example's predicted class
    pub fn write(&mut self, index: usize, predicted_class: usize) -> std::io::Result<()> {
        writeln!(self.out_file, "{},{}", index, predicted_class)
    }

    /// Flush buffered rows to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out_file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_training_logger_writes_header_and_rows() {
        let path = std::env::temp_dir().join("cesario_test_training_log.csv");
        let path = path.to_str().unwrap();

        let mut logger = TrainingLogger::new(path).unwrap();
        logger.log(1, 0.5, 0.75).unwrap();
        logger.log(2, 0.25, 1.0).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "epoch,elapsed_seconds,loss,accuracy");
        assert!(lines[1].starts_with("1,"));
        assert!(lines[1].ends_with(",0.500000,0.7500"));
        assert_eq!(lines.len(), 3);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_prediction_writer_two_column_format() {
        let path = std::env::temp_dir().join("cesario_test_predictions.csv");
        let path = path.to_str().unwrap();

        let mut writer = PredictionWriter::new(path).unwrap();
        writer.write(0, 3).unwrap();
        writer.write(1, 7).unwrap();
        writer.flush().unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "index,predicted_class\n0,3\n1,7\n");

        fs::remove_file(path).ok();
    }
}
