// src/scoring/bundle.rs
//
// Versioned model-bundle format: one JSON document carrying the feature
// schema, the fitted normalizer and the classifier parameters.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use adhdscreen_common::error::ScoreError;
use crate::Error;
use crate::scoring::scorer::{FrozenClassifier, FrozenNormalizer};
use crate::scoring::validator::FeatureSchema;

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleFile {
    format_version: u32,
    features: Vec<String>,
    normalizer: NormalizerSpec,
    classifier: ClassifierSpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NormalizerSpec {
    Identity { width: usize },
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, max: Vec<f64> },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierSpec {
    Linear { coefficients: Vec<f64>, intercept: f64 },
    Logistic { coefficients: Vec<f64>, intercept: f64 },
}

#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    width: usize,
}

impl IdentityNormalizer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl FrozenNormalizer for IdentityNormalizer {
    fn input_width(&self) -> usize {
        self.width
    }

    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }
}

/// z = (x - mean) / scale
#[derive(Debug, Clone)]
pub struct StandardNormalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FrozenNormalizer for StandardNormalizer {
    fn input_width(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// z = (x - min) / (max - min)
#[derive(Debug, Clone)]
pub struct MinMaxNormalizer {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl FrozenNormalizer for MinMaxNormalizer {
    fn input_width(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.min.iter().zip(&self.max))
            .map(|(v, (lo, hi))| (v - lo) / (hi - lo))
            .collect()
    }
}

/// Plain regression output `w.x + b`, used directly as the confidence.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    fn decision(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + self.intercept
    }
}

impl FrozenClassifier for LinearClassifier {
    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, x: &[f64]) -> f64 {
        self.decision(x)
    }
}

/// `sigmoid(w.x + b)`
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    linear: LinearClassifier,
}

impl FrozenClassifier for LogisticClassifier {
    fn input_width(&self) -> usize {
        self.linear.input_width()
    }

    fn predict(&self, x: &[f64]) -> f64 {
        1.0 / (1.0 + (-self.linear.decision(x)).exp())
    }
}

/// Everything the scorer needs, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    schema: FeatureSchema,
    normalizer: Arc<dyn FrozenNormalizer>,
    classifier: Arc<dyn FrozenClassifier>,
}

impl ModelBundle {
    pub fn new(
        schema: FeatureSchema,
        normalizer: Arc<dyn FrozenNormalizer>,
        classifier: Arc<dyn FrozenClassifier>,
    ) -> Result<Self, Error> {
        if normalizer.input_width() != schema.len() {
            return Err(Error::InvalidInput(format!(
                "normalizer width {} does not match {} features",
                normalizer.input_width(),
                schema.len()
            )));
        }
        if classifier.input_width() != schema.len() {
            return Err(Error::InvalidInput(format!(
                "classifier width {} does not match {} features",
                classifier.input_width(),
                schema.len()
            )));
        }
        Ok(Self { schema, normalizer, classifier })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn normalizer(&self) -> &dyn FrozenNormalizer {
        self.normalizer.as_ref()
    }

    pub fn classifier(&self) -> &dyn FrozenClassifier {
        self.classifier.as_ref()
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        let de = &mut serde_json::Deserializer::from_str(text);
        let file: BundleFile = serde_path_to_error::deserialize(de)
            .map_err(|e| Error::InvalidInput(format!("bundle field '{}': {}", e.path(), e.inner())))?;
        Self::from_file(file)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn from_file(file: BundleFile) -> Result<Self, Error> {
        if file.format_version != BUNDLE_FORMAT_VERSION {
            return Err(Error::InvalidInput(format!(
                "unsupported bundle format_version {} (expected {})",
                file.format_version, BUNDLE_FORMAT_VERSION
            )));
        }
        let schema = FeatureSchema::new(file.features)?;

        let normalizer: Arc<dyn FrozenNormalizer> = match file.normalizer {
            NormalizerSpec::Identity { width } => Arc::new(IdentityNormalizer::new(width)),
            NormalizerSpec::Standard { mean, scale } => {
                check_params("mean", &mean, mean.len())?;
                check_params("scale", &scale, mean.len())?;
                if scale.iter().any(|s| *s == 0.0) {
                    return Err(Error::InvalidInput("normalizer scale contains zero".into()));
                }
                Arc::new(StandardNormalizer { mean, scale })
            }
            NormalizerSpec::MinMax { min, max } => {
                check_params("min", &min, min.len())?;
                check_params("max", &max, min.len())?;
                if min.iter().zip(&max).any(|(lo, hi)| hi == lo) {
                    return Err(Error::InvalidInput("normalizer has a zero-width range".into()));
                }
                Arc::new(MinMaxNormalizer { min, max })
            }
        };

        let classifier: Arc<dyn FrozenClassifier> = match file.classifier {
            ClassifierSpec::Linear { coefficients, intercept } => {
                check_params("coefficients", &coefficients, coefficients.len())?;
                check_params("intercept", &[intercept], 1)?;
                Arc::new(LinearClassifier::new(coefficients, intercept))
            }
            ClassifierSpec::Logistic { coefficients, intercept } => {
                check_params("coefficients", &coefficients, coefficients.len())?;
                check_params("intercept", &[intercept], 1)?;
                Arc::new(LogisticClassifier {
                    linear: LinearClassifier::new(coefficients, intercept),
                })
            }
        };

        Self::new(schema, normalizer, classifier)
    }
}

fn check_params(name: &str, values: &[f64], expected_len: usize) -> Result<(), Error> {
    if values.len() != expected_len {
        return Err(Error::InvalidInput(format!(
            "{} has {} entries, expected {}",
            name,
            values.len(),
            expected_len
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput(format!("{} contains a non-finite value", name)));
    }
    Ok(())
}

/// Scoring's view of the startup load: either a bundle or the reason there isn't one.
#[derive(Debug, Clone)]
pub enum ModelHandle {
    Loaded(Arc<ModelBundle>),
    Unavailable(String),
}

impl ModelHandle {
    pub fn bundle(&self) -> Result<&ModelBundle, ScoreError> {
        match self {
            ModelHandle::Loaded(bundle) => Ok(bundle.as_ref()),
            ModelHandle::Unavailable(reason) => Err(ScoreError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelHandle::Loaded(_))
    }
}

impl From<ModelBundle> for ModelHandle {
    fn from(bundle: ModelBundle) -> Self {
        ModelHandle::Loaded(Arc::new(bundle))
    }
}

/// Tries each configured bundle path in order; the first that loads wins.
/// Never fails: with nothing loadable the handle reports the collected reasons.
pub fn load_first(paths: &[PathBuf]) -> ModelHandle {
    if paths.is_empty() {
        error!("No model bundle configured; scoring is disabled.");
        return ModelHandle::Unavailable("no model bundle configured".into());
    }

    let mut failures = Vec::new();
    for path in paths {
        match ModelBundle::load(path) {
            Ok(bundle) => {
                info!(
                    "Loaded model bundle from {} ({} features)",
                    path.display(),
                    bundle.schema().len()
                );
                return bundle.into();
            }
            Err(e) => {
                warn!("Model bundle {} could not be loaded: {}", path.display(), e);
                failures.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    error!("No model bundle could be loaded; scoring is disabled.");
    ModelHandle::Unavailable(failures.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "format_version": 1,
        "features": ["a", "b"],
        "normalizer": {"kind": "standard", "mean": [1.0, 2.0], "scale": [2.0, 4.0]},
        "classifier": {"kind": "linear", "coefficients": [0.5, 0.25], "intercept": 0.1}
    }"#;

    fn write_tmp(text: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn standard_linear_bundle_scores_as_expected() {
        let bundle = ModelBundle::from_json(VALID).unwrap();
        assert_eq!(bundle.schema().names(), &["a".to_string(), "b".to_string()]);
        let z = bundle.normalizer().transform(&[3.0, 6.0]);
        assert_eq!(z, vec![1.0, 1.0]);
        let out = bundle.classifier().predict(&z);
        assert!((out - 0.85).abs() < 1e-12);
    }

    #[test]
    fn shipped_example_bundle_loads() {
        let bundle = ModelBundle::from_json(include_str!("../../../model/bundle.example.json")).unwrap();
        assert_eq!(bundle.schema().len(), 11);
        assert_eq!(bundle.schema().names()[0], "General TScore Omissions");

        // Every input at its training mean: only the intercept remains.
        let at_mean = [50.0, 50.0, 4.0, 50.0, 50.0, 12.0, 50.0, 380.0, 50.0, 50.0, 0.8];
        let z = bundle.normalizer().transform(&at_mean);
        assert!(z.iter().all(|v| v.abs() < 1e-12));
        let p = bundle.classifier().predict(&z);
        assert!((p - 1.0 / (1.0 + 0.6f64.exp())).abs() < 1e-12);
    }

    #[test]
    fn logistic_bundle_outputs_probabilities() {
        let text = r#"{
            "format_version": 1,
            "features": ["x"],
            "normalizer": {"kind": "identity", "width": 1},
            "classifier": {"kind": "logistic", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        let bundle = ModelBundle::from_json(text).unwrap();
        assert!((bundle.classifier().predict(&[0.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn min_max_bundle_rescales() {
        let text = r#"{
            "format_version": 1,
            "features": ["x"],
            "normalizer": {"kind": "min_max", "min": [10.0], "max": [20.0]},
            "classifier": {"kind": "linear", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        let bundle = ModelBundle::from_json(text).unwrap();
        assert_eq!(bundle.normalizer().transform(&[15.0]), vec![0.5]);
    }

    #[test]
    fn rejects_unknown_version_and_width_mismatch() {
        let wrong_version = VALID.replace("\"format_version\": 1", "\"format_version\": 2");
        assert!(ModelBundle::from_json(&wrong_version).is_err());

        let wrong_width = VALID.replace("[0.5, 0.25]", "[0.5]");
        assert!(ModelBundle::from_json(&wrong_width).is_err());

        let zero_scale = VALID.replace("[2.0, 4.0]", "[2.0, 0.0]");
        assert!(ModelBundle::from_json(&zero_scale).is_err());
    }

    #[test]
    fn parse_errors_name_the_field() {
        let broken = VALID.replace("\"intercept\": 0.1", "\"intercept\": \"high\"");
        let err = ModelBundle::from_json(&broken).unwrap_err().to_string();
        assert!(err.contains("classifier"), "{}", err);
    }

    #[test]
    fn load_first_falls_back_in_configured_order() {
        let corrupt = write_tmp("not json");
        let good = write_tmp(VALID);
        let paths = vec![
            PathBuf::from("/nonexistent/bundle.json"),
            corrupt.path().to_path_buf(),
            good.path().to_path_buf(),
        ];
        let handle = load_first(&paths);
        assert!(handle.is_available());
        assert_eq!(handle.bundle().unwrap().schema().len(), 2);
    }

    #[test]
    fn load_first_reports_every_failure() {
        let corrupt = write_tmp("{}");
        let paths = vec![PathBuf::from("/nonexistent/bundle.json"), corrupt.path().to_path_buf()];
        let handle = load_first(&paths);
        match handle.bundle() {
            Err(ScoreError::ModelUnavailable(reason)) => {
                assert!(reason.contains("/nonexistent/bundle.json"));
                assert!(reason.contains(&corrupt.path().display().to_string()));
            }
            other => panic!("expected ModelUnavailable, got {:?}", other),
        }
        assert!(!load_first(&[]).is_available());
    }
}
