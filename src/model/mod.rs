//! Tree ensemble model
//!
//! - `tree`: single CART regression tree
//! - `forest`: bagged random forest over those trees
//! - `artifact`: on-disk persistence of a fitted forest

pub mod artifact;
pub mod forest;
pub mod tree;

pub use artifact::ARTIFACT_FILE_NAME;
pub use forest::{ForestParams, RandomForestRegressor};
pub use tree::{RegressionTree, TreeParams};
