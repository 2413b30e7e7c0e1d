//! Training dataset loaded from CSV
//!
//! The header row names the columns; the ten feature columns and the target
//! column are picked out by name, so column order and extra columns do not matter.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::features::{FeatureFrame, FeatureRecord, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::{GradeError, Result};

/// Feature rows with their final grade labels
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<FeatureRecord>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    /// Load from a CSV file on disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GradeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open training data {}: {}", path.display(), e),
            ))
        })?;
        Self::from_reader(file)
    }

    /// Load from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(GradeError::MissingColumn(FEATURE_COLUMNS[0].to_string())),
        };
        let header: Vec<String> = split_row(&header).map(str::to_string).collect();

        let column_index = |name: &str| -> Result<usize> {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| GradeError::MissingColumn(name.to_string()))
        };

        let mut feature_idx = [0usize; FeatureRecord::DIM];
        for (slot, name) in feature_idx.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = column_index(name)?;
        }
        let target_idx = column_index(TARGET_COLUMN)?;

        let mut set = TrainingSet::default();

        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // Header is line 1
            let line_no = i + 2;
            let cells: Vec<&str> = split_row(&line).collect();

            let cell = |idx: usize| -> Result<f64> {
                let raw = cells.get(idx).copied().unwrap_or("");
                raw.parse::<f64>().map_err(|_| GradeError::InvalidCsvValue {
                    line: line_no,
                    column: header[idx].clone(),
                    value: raw.to_string(),
                })
            };

            let mut values = [0.0f64; FeatureRecord::DIM];
            for (slot, idx) in values.iter_mut().zip(feature_idx) {
                *slot = cell(idx)?;
            }
            set.features.push(FeatureRecord::from_array(values));
            set.targets.push(cell(target_idx)?);
        }

        log::debug!("Parsed {} training rows", set.len());
        Ok(set)
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Feature rows as a named-column table
    pub fn to_frame(&self) -> FeatureFrame {
        FeatureFrame::from_records(&self.features)
    }
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches('\r')
        .split(',')
        .map(|s| s.trim().trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "study_hours,attendance,previous_grade,project_score,quiz_average,study_group_hours,tutorial_attendance,sleep_hours,stress_level,extracurricular_hours,final_grade";

    #[test]
    fn test_load_rows() {
        let csv = format!(
            "{}\n5,90,80,75,70,2,1,7,3,4,82.5\n1,50,60,55,40,0,0,5,8,1,51\n",
            HEADER
        );
        let set = TrainingSet::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.targets, vec![82.5, 51.0]);
        assert_eq!(set.features[0].attendance, 90.0);
        assert_eq!(set.features[1].stress_level, 8.0);
    }

    #[test]
    fn test_columns_found_by_name() {
        let csv = "student_id,final_grade,extracurricular_hours,stress_level,sleep_hours,tutorial_attendance,study_group_hours,quiz_average,project_score,previous_grade,attendance,study_hours\r\n\
                   17,88,4,3,7,1,2,70,75,80,90,5\r\n";
        let set = TrainingSet::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.targets[0], 88.0);
        assert_eq!(
            set.features[0].to_array(),
            [5.0, 90.0, 80.0, 75.0, 70.0, 2.0, 1.0, 7.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_missing_target_column() {
        let header = HEADER.replace(",final_grade", "");
        let csv = format!("{}\n5,90,80,75,70,2,1,7,3,4\n", header);
        let err = TrainingSet::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GradeError::MissingColumn(ref c) if c == "final_grade"));
    }

    #[test]
    fn test_missing_feature_column() {
        let header = HEADER.replace("sleep_hours,", "");
        let csv = format!("{}\n5,90,80,75,70,2,1,3,4,82\n", header);
        let err = TrainingSet::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GradeError::MissingColumn(ref c) if c == "sleep_hours"));
    }

    #[test]
    fn test_invalid_cell() {
        let csv = format!("{}\n5,90,80,75,70,2,1,7,3,4,82\n5,ninety,80,75,70,2,1,7,3,4,82\n", HEADER);
        match TrainingSet::from_reader(csv.as_bytes()) {
            Err(GradeError::InvalidCsvValue { line, column, value }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "attendance");
                assert_eq!(value, "ninety");
            }
            other => panic!("expected invalid value error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = TrainingSet::from_csv_path("/nonexistent/training_data.csv").unwrap_err();
        assert!(matches!(err, GradeError::Io(_)));
    }

    #[test]
    fn test_header_only_is_empty() {
        let set = TrainingSet::from_reader(format!("{}\n", HEADER).as_bytes()).unwrap();
        assert!(set.is_empty());
    }
}
