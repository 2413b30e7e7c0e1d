//! Data ingestion
//!
//! Reads the training CSV into feature rows and labels.

pub mod dataset;

pub use dataset::TrainingSet;
