//! Feature schema and encoding
//!
//! Converts request payloads and CSV rows into model-ready feature tables.

pub mod frame;
pub mod payload;
pub mod record;

pub use frame::FeatureFrame;
pub use payload::parse_record;
pub use record::{FeatureRecord, FEATURE_COLUMNS, REQUEST_KEYS, TARGET_COLUMN};
