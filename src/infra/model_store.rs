// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores a TrainedModel as one deflate zip.
//
// Entries:
//   1. manifest.json      — format version, trainer, slot names, time
//   2. pipeline.json      — fitted stages (vocabularies, min/max)
//   3. classifier.json    — coefficients or trees
//   4. train_config.json  — the run configuration, for reproduction
//
// Saving overwrites any existing file. Loading checks that the
// three model parts agree on the feature layout before handing
// the model back.
//
//   model/
//     attritionModel.zip
//     training_log.csv      ← written by MetricsLogger
//     evaluation_log.csv

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{AttritionError, Result};
use crate::ml::classifier::{Classifier, ModelManifest, TrainedModel};
use crate::data::pipeline::FittedPipeline;

const MANIFEST_ENTRY: &str = "manifest.json";
const PIPELINE_ENTRY: &str = "pipeline.json";
const CLASSIFIER_ENTRY: &str = "classifier.json";
const CONFIG_ENTRY: &str = "train_config.json";

pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory the model file lives in; the run logs go here too.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// Write `model` and the run `config` into the zip, replacing it.
    pub fn save<C: Serialize>(&self, model: &TrainedModel, config: &C) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| AttritionError::io(dir, e))?;

        let file = File::create(&self.path).map_err(|e| AttritionError::io(&self.path, e))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let entries = [
            (MANIFEST_ENTRY, to_json(model.manifest())?),
            (PIPELINE_ENTRY, to_json(model.pipeline())?),
            (CLASSIFIER_ENTRY, to_json(model.classifier())?),
            (CONFIG_ENTRY, to_json(config)?),
        ];
        for (name, json) in entries {
            zip.start_file(name, options).map_err(|e| self.zip_error(e))?;
            zip.write_all(json.as_bytes()).map_err(|e| AttritionError::io(&self.path, e))?;
        }
        zip.finish().map_err(|e| self.zip_error(e))?;

        tracing::debug!("Saved model to '{}'", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<TrainedModel> {
        let mut archive = self.open()?;
        let manifest: ModelManifest = read_entry(&mut archive, MANIFEST_ENTRY)?;
        let pipeline: FittedPipeline = read_entry(&mut archive, PIPELINE_ENTRY)?;
        let classifier: Classifier = read_entry(&mut archive, CLASSIFIER_ENTRY)?;

        tracing::info!(
            "Loaded {} model with {} features from '{}'",
            manifest.trainer,
            manifest.num_features,
            self.path.display()
        );
        TrainedModel::from_parts(pipeline, classifier, manifest)
    }

    /// The configuration the stored model was trained with.
    pub fn load_config<C: DeserializeOwned>(&self) -> Result<C> {
        let mut archive = self.open()?;
        read_entry(&mut archive, CONFIG_ENTRY)
    }

    fn open(&self) -> Result<ZipArchive<File>> {
        let file = File::open(&self.path).map_err(|e| AttritionError::io(&self.path, e))?;
        ZipArchive::new(file).map_err(|e| self.zip_error(e))
    }

    fn zip_error(&self, e: zip::result::ZipError) -> AttritionError {
        AttritionError::ModelFormat(format!("'{}': {e}", self.path.display()))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AttritionError::ModelFormat(format!("serialising model: {e}")))
}

fn read_entry<T: DeserializeOwned>(archive: &mut ZipArchive<File>, name: &str) -> Result<T> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| AttritionError::ModelFormat(format!("missing entry '{name}': {e}")))?;
    let mut json = String::new();
    entry
        .read_to_string(&mut json)
        .map_err(|e| AttritionError::ModelFormat(format!("reading '{name}': {e}")))?;
    serde_json::from_str(&json).map_err(|e| AttritionError::ModelFormat(format!("parsing '{name}': {e}")))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pipeline::{CategoricalEncoding, PipelineSpec};
    use crate::ml::model::LogisticModel;
    use crate::test_support::employee_dataset;

    fn model() -> TrainedModel {
        let data = employee_dataset(50, 4);
        let pipeline = PipelineSpec::attrition(data.schema(), CategoricalEncoding::Hashed { bits: 3 }, true)
            .fit(&data)
            .unwrap();
        let weights = (0..pipeline.num_features()).map(|i| i as f32 * 0.01).collect();
        TrainedModel::new(pipeline, Classifier::Logistic(LogisticModel::new(weights, -0.3))).unwrap()
    }

    #[test]
    fn save_then_load_restores_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("nested").join("model.zip"));
        let original = model();
        store.save(&original, &vec![1u32, 2, 3]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(store.load_config::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn saving_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.zip"));
        store.save(&model(), &"first").unwrap();
        store.save(&model(), &"second").unwrap();
        assert_eq!(store.load_config::<String>().unwrap(), "second");
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelStore::new(dir.path().join("absent.zip")).load().unwrap_err();
        assert!(matches!(err, AttritionError::FileNotFound { .. }));
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.zip");
        fs::write(&path, b"not a zip").unwrap();
        let err = ModelStore::new(path).load().unwrap_err();
        assert!(matches!(err, AttritionError::ModelFormat(_)));
    }

    #[test]
    fn missing_entry_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        zip.start_file(MANIFEST_ENTRY, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();

        let err = ModelStore::new(path).load().unwrap_err();
        assert!(matches!(err, AttritionError::ModelFormat(_)));
    }
}
