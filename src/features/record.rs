//! Student activity feature record
//!
//! The ten numeric inputs the model is fitted on, in their fixed column order.

use serde::{Deserialize, Serialize};

/// Column names of the feature table, in model input order
pub const FEATURE_COLUMNS: [&str; FeatureRecord::DIM] = [
    "study_hours",
    "attendance",
    "previous_grade",
    "project_score",
    "quiz_average",
    "study_group_hours",
    "tutorial_attendance",
    "sleep_hours",
    "stress_level",
    "extracurricular_hours",
];

/// Request payload keys, index-aligned with [`FEATURE_COLUMNS`]
pub const REQUEST_KEYS: [&str; FeatureRecord::DIM] = [
    "studyHours",
    "attendance",
    "previousGrade",
    "projectScore",
    "quizAverage",
    "studyGroupHours",
    "tutorialAttendance",
    "sleepHours",
    "stressLevel",
    "extracurricularHours",
];

/// Label column of the training CSV
pub const TARGET_COLUMN: &str = "final_grade";

/// One row of student activity features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub study_hours: f64,
    pub attendance: f64,
    pub previous_grade: f64,
    pub project_score: f64,
    pub quiz_average: f64,
    pub study_group_hours: f64,
    pub tutorial_attendance: f64,
    pub sleep_hours: f64,
    pub stress_level: f64,
    pub extracurricular_hours: f64,
}

impl FeatureRecord {
    /// Number of features
    pub const DIM: usize = 10;

    /// Build from values ordered as [`FEATURE_COLUMNS`]
    pub fn from_array(values: [f64; Self::DIM]) -> Self {
        let [study_hours, attendance, previous_grade, project_score, quiz_average, study_group_hours, tutorial_attendance, sleep_hours, stress_level, extracurricular_hours] =
            values;
        FeatureRecord {
            study_hours,
            attendance,
            previous_grade,
            project_score,
            quiz_average,
            study_group_hours,
            tutorial_attendance,
            sleep_hours,
            stress_level,
            extracurricular_hours,
        }
    }

    /// Values ordered as [`FEATURE_COLUMNS`]
    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.study_hours,
            self.attendance,
            self.previous_grade,
            self.project_score,
            self.quiz_average,
            self.study_group_hours,
            self.tutorial_attendance,
            self.sleep_hours,
            self.stress_level,
            self.extracurricular_hours,
        ]
    }

    /// Request key for a table column, if the column is a feature
    pub fn request_key(column: &str) -> Option<&'static str> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| REQUEST_KEYS[i])
    }
}
