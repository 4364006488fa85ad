//! Model artifact loading.
//!
//! The training pipeline exports the fitted classifier as JSON, optionally
//! zstd-compressed. The artifact is read once at startup; any problem here is
//! fatal and the server never binds its listener.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::inference::classifier::{Classifier, LogisticRegression, MultiClass};

/// zstd frame magic number, little-endian on disk.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

#[derive(Error, Debug)]
pub enum ModelLoaderError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decompress model artifact: {0}")]
    Decompress(std::io::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("Unsupported model type {0:?}, expected \"logistic_regression\"")]
    UnsupportedModel(String),

    #[error("Inconsistent model parameters: {0}")]
    Shape(String),
}

/// On-disk artifact layout.
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model_type: String,
    #[serde(default)]
    multi_class: MultiClass,
    classes: Vec<String>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

/// Requirements the serving configuration places on the loaded model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequirements {
    pub n_features: usize,
    pub min_classes: usize,
}

/// Load a classifier from `path` and check it against `requirements`.
pub fn load_model(
    path: &Path,
    requirements: ModelRequirements,
) -> Result<Arc<dyn Classifier>, ModelLoaderError> {
    if !path.exists() {
        return Err(ModelLoaderError::FileNotFound(path.display().to_string()));
    }

    let raw = std::fs::read(path)?;
    let file_size = raw.len();
    let model = parse_artifact(&raw)?;

    if model.n_features() != requirements.n_features {
        return Err(ModelLoaderError::Shape(format!(
            "model expects {} features, server is configured for {}",
            model.n_features(),
            requirements.n_features
        )));
    }
    if model.classes.len() < requirements.min_classes {
        return Err(ModelLoaderError::Shape(format!(
            "model has {} classes, at least {} are needed for ranking",
            model.classes.len(),
            requirements.min_classes
        )));
    }

    info!(
        path = %path.display(),
        file_size,
        multi_class = %model.multi_class,
        classes = model.classes.len(),
        features = model.n_features(),
        "Loaded model artifact"
    );
    debug!(classes = ?model.classes, feature_names = ?model.feature_names, "Model labels");

    Ok(Arc::new(model))
}

/// Decode artifact bytes (plain or zstd-compressed JSON) into a validated model.
pub fn parse_artifact(raw: &[u8]) -> Result<LogisticRegression, ModelLoaderError> {
    let json = if raw.starts_with(&ZSTD_MAGIC) {
        zstd::stream::decode_all(raw).map_err(ModelLoaderError::Decompress)?
    } else {
        raw.to_vec()
    };

    let artifact: ModelArtifact = serde_json::from_slice(&json)?;
    if artifact.model_type != "logistic_regression" {
        return Err(ModelLoaderError::UnsupportedModel(artifact.model_type));
    }

    let model = LogisticRegression {
        multi_class: artifact.multi_class,
        classes: artifact.classes,
        feature_names: artifact.feature_names,
        coef: artifact.coef,
        intercept: artifact.intercept,
    };
    model.validate().map_err(ModelLoaderError::Shape)?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"{
        "model_type": "logistic_regression",
        "classes": ["maize", "rice", "jute"],
        "coef": [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]],
        "intercept": [0.0, 0.1, 0.2]
    }"#;

    fn requirements() -> ModelRequirements {
        ModelRequirements {
            n_features: 2,
            min_classes: 3,
        }
    }

    #[test]
    fn test_parse_defaults_to_multinomial() {
        let model = parse_artifact(TINY.as_bytes()).unwrap();
        assert_eq!(model.multi_class, MultiClass::Multinomial);
        assert_eq!(model.classes, vec!["maize", "rice", "jute"]);
        assert!(model.feature_names.is_none());
    }

    #[test]
    fn test_parse_zstd_artifact() {
        let compressed = zstd::stream::encode_all(TINY.as_bytes(), 3).unwrap();
        assert!(compressed.starts_with(&ZSTD_MAGIC));
        let model = parse_artifact(&compressed).unwrap();
        assert_eq!(model.classes.len(), 3);
    }

    #[test]
    fn test_wrong_model_type() {
        let raw = TINY.replace("logistic_regression", "random_forest");
        let err = parse_artifact(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelLoaderError::UnsupportedModel(ref t) if t == "random_forest"));
    }

    #[test]
    fn test_corrupt_artifact() {
        let err = parse_artifact(b"\x80\x04\x95pickle").unwrap_err();
        assert!(matches!(err, ModelLoaderError::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_model(Path::new("/nonexistent/model.json"), requirements()).unwrap_err();
        assert!(matches!(err, ModelLoaderError::FileNotFound(_)));
    }

    #[test]
    fn test_load_checks_requirements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, TINY).unwrap();

        let model = load_model(&path, requirements()).unwrap();
        assert_eq!(model.n_features(), 2);

        let err = load_model(
            &path,
            ModelRequirements {
                n_features: 7,
                min_classes: 3,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ModelLoaderError::Shape(_)));

        let err = load_model(
            &path,
            ModelRequirements {
                n_features: 2,
                min_classes: 4,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 4"));
    }
}
