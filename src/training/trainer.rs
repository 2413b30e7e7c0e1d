//! Offline training pipeline
//!
//! Load the CSV, fit the forest over the full dataset, save the artifact.

use std::path::PathBuf;

use crate::data::TrainingSet;
use crate::features::FEATURE_COLUMNS;
use crate::model::{artifact, ForestParams, RandomForestRegressor};
use crate::training::metrics::RegressionMetrics;
use crate::training::parallelism::Parallelism;
use crate::{Config, GradeError, Result, TrainingConfig};

/// A fitted model and how well it fits its own training data
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: RandomForestRegressor,
    pub metrics: RegressionMetrics,
}

/// Fits random forests on a training set
pub struct ForestTrainer {
    params: ForestParams,
    parallelism: Parallelism,
}

impl ForestTrainer {
    pub fn new(params: ForestParams, parallelism: Parallelism) -> Self {
        ForestTrainer {
            params,
            parallelism,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(ForestParams::from(config), Parallelism::from_jobs(config.n_jobs))
    }

    /// Fit on every row; there is no validation split
    pub fn train(&self, dataset: &TrainingSet) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(GradeError::EmptyDataset);
        }

        let frame = dataset.to_frame();
        log::info!(
            "Fitting {} trees (seed {}, bootstrap {}) on {} samples",
            self.params.n_estimators,
            self.params.random_state,
            self.params.bootstrap,
            dataset.len()
        );

        let model =
            RandomForestRegressor::fit_frame(&frame, &dataset.targets, self.params, self.parallelism)?;

        let predictions = model.predict(frame.rows())?;
        let metrics = RegressionMetrics::compute(&predictions, &dataset.targets);
        log::info!("Training fit: {}", metrics);
        log::info!(
            "Forest size: {} trees, {} nodes",
            model.n_trees(),
            model.total_nodes()
        );

        Ok(TrainingOutcome { model, metrics })
    }
}

/// Feature names paired with importances, most important first
pub fn ranked_importances(model: &RandomForestRegressor) -> Vec<(&'static str, f64)> {
    let mut ranked: Vec<(&'static str, f64)> = FEATURE_COLUMNS
        .iter()
        .copied()
        .zip(model.feature_importances())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Run the full training job described by `config`, returning the artifact path
pub fn run_training(config: &Config) -> Result<PathBuf> {
    let training_path = &config.data.training_path;
    println!("Loading data from {}", training_path);
    let dataset = TrainingSet::from_csv_path(training_path)?;
    println!("Data loaded successfully");
    log::info!("{} rows, {} features", dataset.len(), FEATURE_COLUMNS.len());

    println!("Training model...");
    let trainer = ForestTrainer::from_config(&config.training);
    let outcome = trainer.train(&dataset)?;
    println!("Model training completed");

    for (name, importance) in ranked_importances(&outcome.model) {
        log::info!("  {:<22} {:.4}", name, importance);
    }

    let model_path = artifact::artifact_path(&config.data.model_dir);
    println!("Saving model to {}", model_path.display());
    let path = artifact::save(&outcome.model, &config.data.model_dir)?;
    println!("Model saved successfully");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureRecord;
    use crate::predict::{GradeHandler, InferenceHandler};
    use approx::assert_relative_eq;
    use std::fs;

    const HEADER: &str = "study_hours,attendance,previous_grade,project_score,quiz_average,study_group_hours,tutorial_attendance,sleep_hours,stress_level,extracurricular_hours,final_grade";

    fn synthetic_csv(rows: usize) -> String {
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for i in 0..rows {
            let study = (i % 10) as f64;
            let attendance = 60.0 + (i % 40) as f64;
            let previous = 50.0 + (i * 7 % 50) as f64;
            let grade = 0.4 * previous + 0.3 * attendance + 2.0 * study;
            csv.push_str(&format!(
                "{},{},{},70,65,{},1,7,{},2,{:.2}\n",
                study,
                attendance,
                previous,
                i % 4,
                i % 5,
                grade
            ));
        }
        csv
    }

    fn small_config(dir: &std::path::Path, rows: usize) -> Config {
        let csv_path = dir.join("training_data.csv");
        fs::write(&csv_path, synthetic_csv(rows)).unwrap();

        let mut config = Config::default();
        config.data.training_path = csv_path.to_str().unwrap().to_string();
        config.data.model_dir = dir.join("model").to_str().unwrap().to_string();
        config.training.n_estimators = 10;
        config
    }

    #[test]
    fn test_trainer_reports_metrics() {
        let dataset = TrainingSet::from_reader(synthetic_csv(60).as_bytes()).unwrap();
        let trainer = ForestTrainer::new(
            ForestParams {
                n_estimators: 15,
                ..ForestParams::default()
            },
            Parallelism::Sequential,
        );

        let outcome = trainer.train(&dataset).unwrap();
        assert_eq!(outcome.metrics.n_samples, 60);
        assert!(outcome.metrics.r2 > 0.8, "r2 = {}", outcome.metrics.r2);
    }

    #[test]
    fn test_trainer_rejects_empty_dataset() {
        let trainer = ForestTrainer::from_config(&TrainingConfig::default());
        assert!(matches!(
            trainer.train(&TrainingSet::default()),
            Err(GradeError::EmptyDataset)
        ));
    }

    #[test]
    fn test_ranked_importances_sorted() {
        let dataset = TrainingSet::from_reader(synthetic_csv(50).as_bytes()).unwrap();
        let trainer = ForestTrainer::from_config(&TrainingConfig {
            n_estimators: 5,
            ..TrainingConfig::default()
        });
        let outcome = trainer.train(&dataset).unwrap();

        let ranked = ranked_importances(&outcome.model);
        assert_eq!(ranked.len(), FeatureRecord::DIM);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_relative_eq!(ranked.iter().map(|r| r.1).sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_end_to_end_train_load_predict() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), 40);

        let path = run_training(&config).unwrap();
        assert_eq!(path, dir.path().join("model").join("model.joblib"));
        assert!(path.exists());

        let handler = GradeHandler;
        let model = handler.load_model(dir.path().join("model").as_path()).unwrap();
        let body = br#"{"studyHours":5,"attendance":90,"previousGrade":80,"projectScore":75,"quizAverage":70,"studyGroupHours":2,"tutorialAttendance":1,"sleepHours":7,"stressLevel":3,"extracurricularHours":4}"#;
        let frame = handler.parse_input(body, "application/json").unwrap();
        let prediction = handler.predict(&frame, &model).unwrap();

        assert_eq!(prediction.0.len(), 1);
        assert!(prediction.0[0].is_finite());
    }

    #[test]
    fn test_missing_column_writes_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path(), 10);
        let bad_csv = synthetic_csv(10).replacen("final_grade", "grade", 1);
        fs::write(&config.data.training_path, bad_csv).unwrap();
        config.data.model_dir = dir.path().join("out").to_str().unwrap().to_string();

        let err = run_training(&config).unwrap_err();
        assert!(matches!(err, GradeError::MissingColumn(ref c) if c == "final_grade"));
        assert!(!dir.path().join("out").join("model.joblib").exists());
    }

    #[test]
    fn test_infinite_feature_writes_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), 20);
        let mut lines: Vec<String> = synthetic_csv(20).lines().map(String::from).collect();
        let first = lines[1].split_once(',').map(|(_, rest)| rest.to_string()).unwrap();
        lines[1] = format!("-inf,{}", first);
        fs::write(&config.data.training_path, lines.join("\n")).unwrap();

        let err = run_training(&config).unwrap_err();
        assert!(matches!(err, GradeError::NonFiniteFeature { row: 0, column: 0 }));
        assert!(!dir.path().join("model").join("model.joblib").exists());
    }

    #[test]
    fn test_overflowing_targets_write_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path(), 20);
        let mut csv = String::from(HEADER);
        for i in 0..20 {
            let target = if i % 2 == 0 { "1e200" } else { "-1e200" };
            csv.push_str(&format!("\n{},80,70,70,65,1,1,7,3,2,{}", i, target));
        }
        fs::write(&config.data.training_path, csv).unwrap();

        let err = run_training(&config).unwrap_err();
        assert!(matches!(err, GradeError::Serialization(_)));
        let model_dir = dir.path().join("model");
        assert!(!model_dir.join("model.joblib").exists());
        assert!(!model_dir.join(".model.joblib.tmp").exists());
    }

    #[test]
    fn test_trained_model_remembers_columns() {
        let dataset = TrainingSet::from_reader(synthetic_csv(20).as_bytes()).unwrap();
        let trainer = ForestTrainer::from_config(&TrainingConfig {
            n_estimators: 2,
            ..TrainingConfig::default()
        });
        let outcome = trainer.train(&dataset).unwrap();

        let names: Vec<&str> = outcome
            .model
            .feature_names()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, FEATURE_COLUMNS.to_vec());
    }

    #[test]
    fn test_missing_training_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path(), 5);
        config.data.training_path = dir.path().join("absent.csv").to_str().unwrap().to_string();

        assert!(matches!(run_training(&config), Err(GradeError::Io(_))));
    }
}
