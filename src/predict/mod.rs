//! Prediction and inference
//!
//! Load trained models and serve predictions for request payloads.

pub mod inference;

pub use inference::{ContentType, GradeHandler, InferenceHandler, Predictor};
