//! Model training
//!
//! Forest fitting, fit metrics, and the offline training job.

pub mod metrics;
pub mod parallelism;
pub mod trainer;

pub use metrics::RegressionMetrics;
pub use parallelism::Parallelism;
pub use trainer::{ranked_importances, run_training, ForestTrainer, TrainingOutcome};
