//! Named-column feature table handed to the model

use crate::features::record::{FeatureRecord, FEATURE_COLUMNS};
use crate::{GradeError, Result};

/// Row-major table of feature values with ordered column names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    /// Create a frame, checking every row has one value per column
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(GradeError::FeatureMismatch {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(FeatureFrame { columns, rows })
    }

    /// Frame with the fixed feature columns, one row per record
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        FeatureFrame {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(|r| r.to_array().to_vec()).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Value at a row for a named column
    pub fn get(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[col])
    }
}
