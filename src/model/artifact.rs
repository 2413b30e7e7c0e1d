//! Model artifact persistence
//!
//! The fitted forest is stored as JSON under the file name the hosting layout
//! expects. Writes go through a sibling temp file and a rename so a failed save
//! never leaves a half-written artifact behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::forest::RandomForestRegressor;
use crate::{GradeError, Result};

/// Artifact file name inside a model directory
pub const ARTIFACT_FILE_NAME: &str = "model.joblib";

/// Full artifact path for a model directory
pub fn artifact_path(model_dir: impl AsRef<Path>) -> PathBuf {
    model_dir.as_ref().join(ARTIFACT_FILE_NAME)
}

/// Write the forest into `model_dir`, creating the directory and replacing any existing artifact
pub fn save(model: &RandomForestRegressor, model_dir: impl AsRef<Path>) -> Result<PathBuf> {
    // JSON has no encoding for inf or NaN
    if !model.is_finite() {
        return Err(GradeError::Serialization(
            "Model contains non-finite values and cannot be saved".to_string(),
        ));
    }

    let model_dir = model_dir.as_ref();
    fs::create_dir_all(model_dir)?;

    let path = artifact_path(model_dir);
    let tmp_path = model_dir.join(format!(".{}.tmp", ARTIFACT_FILE_NAME));

    let write = || -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, model)
            .map_err(|e| GradeError::Serialization(format!("Failed to encode model: {}", e)))?;
        writer.flush()?;
        Ok(())
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, &path)?;

    log::debug!("Wrote {} trees to {}", model.n_trees(), path.display());
    Ok(path)
}

/// Read the forest from `model_dir`
pub fn load(model_dir: impl AsRef<Path>) -> Result<RandomForestRegressor> {
    let path = artifact_path(model_dir);
    if !path.exists() {
        return Err(GradeError::MissingArtifact { path });
    }

    let reader = BufReader::new(File::open(&path)?);
    let model: RandomForestRegressor = serde_json::from_reader(reader).map_err(|e| {
        GradeError::Serialization(format!("Failed to decode {}: {}", path.display(), e))
    })?;

    log::debug!("Loaded {} trees from {}", model.n_trees(), path.display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::ForestParams;
    use crate::training::Parallelism;

    fn tiny_forest() -> RandomForestRegressor {
        let x: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64, (12 - i) as f64]).collect();
        let y: Vec<f64> = (0..12).map(|i| 50.0 + i as f64).collect();
        let params = ForestParams {
            n_estimators: 4,
            ..ForestParams::default()
        };
        RandomForestRegressor::fit(&x, &y, params, Parallelism::Sequential).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny_forest();

        let path = save(&model, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("model.joblib"));

        let loaded = load(dir.path()).unwrap();
        assert_eq!(
            loaded.predict_row(&[3.0, 9.0]).unwrap(),
            model.predict_row(&[3.0, 9.0]).unwrap()
        );
        assert!(!dir.path().join(".model.joblib.tmp").exists());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("nested").join("model");
        assert!(!model_dir.exists());

        save(&tiny_forest(), &model_dir).unwrap();
        assert!(model_dir.is_dir());
        assert!(load(&model_dir).is_ok());
    }

    #[test]
    fn test_save_overwrites_stale_artifact() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(artifact_path(dir.path()), "stale").unwrap();
        assert!(matches!(load(dir.path()), Err(GradeError::Serialization(_))));

        save(&tiny_forest(), dir.path()).unwrap();
        assert!(load(dir.path()).is_ok());
    }

    #[test]
    fn test_refuses_non_finite_model() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..8).map(|i| if i % 2 == 0 { 1e200 } else { -1e200 }).collect();
        let params = ForestParams {
            n_estimators: 2,
            bootstrap: false,
            ..ForestParams::default()
        };
        let model = RandomForestRegressor::fit(&x, &y, params, Parallelism::Sequential).unwrap();
        assert!(!model.is_finite());

        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("model");
        assert!(matches!(save(&model, &model_dir), Err(GradeError::Serialization(_))));
        assert!(!artifact_path(&model_dir).exists());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        match load(dir.path()) {
            Err(GradeError::MissingArtifact { path }) => {
                assert_eq!(path, dir.path().join("model.joblib"))
            }
            other => panic!("expected missing artifact, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(artifact_path(dir.path()), b"\x80\x04not a model").unwrap();
        assert!(matches!(load(dir.path()), Err(GradeError::Serialization(_))));
    }
}
