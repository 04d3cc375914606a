use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PredictError;
use crate::estimator::{ForestModel, LinearModel, LogisticModel};
use crate::outcome::Outcome;

pub const VALUE_MODEL_FILE: &str = "player_value_model.json";
pub const OUTCOME_MODEL_FILE: &str = "in_match_result_model.json";
pub const OUTCOME_SCALER_FILE: &str = "in_match_result_scaler.json";

/// Scores one aligned feature row in log space.
pub trait Regressor: Send + Sync {
    fn feature_names(&self) -> &[String];
    fn predict(&self, row: &[f64]) -> Result<f64, PredictError>;
}

/// Scores one aligned feature row into a distribution over `classes()`.
pub trait Classifier: Send + Sync {
    fn feature_names(&self) -> &[String];
    /// Decoded class labels in the model's own order.
    fn classes(&self) -> &[Outcome];
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionEstimator {
    Linear(LinearModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationEstimator {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorArtifact {
    pub feature_names: Vec<String>,
    #[serde(flatten)]
    pub estimator: RegressionEstimator,
}

/// A class label as the training job wrote it: result codes (`"H"`, `"D"`,
/// `"A"`), outcome names, or label-encoded integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Int(i64),
    Text(String),
}

impl ClassLabel {
    /// Integers carry no meaning of their own: they index `class_names`, the
    /// encoder's original labels, and fail without it.
    pub fn to_outcome(&self, class_names: Option<&[String]>) -> Result<Outcome, String> {
        match self {
            ClassLabel::Text(raw) => {
                outcome_from_text(raw).ok_or_else(|| format!("unrecognized class label {raw:?}"))
            }
            ClassLabel::Int(idx) => {
                let names = class_names
                    .ok_or_else(|| format!("integer class label {idx} without class_names"))?;
                let name = usize::try_from(*idx)
                    .ok()
                    .and_then(|i| names.get(i))
                    .ok_or_else(|| format!("class label {idx} has no entry in class_names"))?;
                outcome_from_text(name)
                    .ok_or_else(|| format!("unrecognized class name {name:?} for label {idx}"))
            }
        }
    }
}

fn outcome_from_text(raw: &str) -> Option<Outcome> {
    let key = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();
    match key.as_str() {
        "H" | "HOME" | "HOMEWIN" => Some(Outcome::HomeWin),
        "D" | "DRAW" => Some(Outcome::Draw),
        "A" | "AWAY" | "AWAYWIN" => Some(Outcome::AwayWin),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub feature_names: Vec<String>,
    pub classes: Vec<ClassLabel>,
    /// Original labels of an integer-encoded target, indexed by code.
    #[serde(default)]
    pub class_names: Option<Vec<String>>,
    #[serde(flatten)]
    pub estimator: ClassificationEstimator,
}

/// Fitted standardization: `(x - mean) / scale`, with zero scale treated as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        if row.len() != self.width() {
            return Err(PredictError::WidthMismatch {
                expected: self.width(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 || !s.is_finite() { 1.0 } else { *s };
                (x - m) / s
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct ValueModel {
    path: PathBuf,
    artifact: RegressorArtifact,
}

impl ValueModel {
    pub fn from_artifact(
        path: impl Into<PathBuf>,
        artifact: RegressorArtifact,
    ) -> Result<Self, PredictError> {
        let path = path.into();
        let n = artifact.feature_names.len();
        if n == 0 {
            return Err(PredictError::invalid_artifact(&path, "no feature names"));
        }
        let checked = match &artifact.estimator {
            RegressionEstimator::Linear(m) if m.coeffs.len() != n => Err(format!(
                "{} coefficients for {n} features",
                m.coeffs.len()
            )),
            RegressionEstimator::Linear(_) => Ok(()),
            RegressionEstimator::Forest(f) => f.check(n, 1),
        };
        checked.map_err(|reason| PredictError::invalid_artifact(&path, reason))?;
        Ok(Self { path, artifact })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &'static str {
        match self.artifact.estimator {
            RegressionEstimator::Linear(_) => "linear",
            RegressionEstimator::Forest(_) => "forest",
        }
    }
}

impl Regressor for ValueModel {
    fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    fn predict(&self, row: &[f64]) -> Result<f64, PredictError> {
        check_width(self.feature_names().len(), row.len())?;
        Ok(match &self.artifact.estimator {
            RegressionEstimator::Linear(m) => m.predict(row),
            RegressionEstimator::Forest(f) => f.predict(row),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeModel {
    path: PathBuf,
    artifact: ClassifierArtifact,
    classes: Vec<Outcome>,
}

impl OutcomeModel {
    pub fn from_artifact(
        path: impl Into<PathBuf>,
        artifact: ClassifierArtifact,
    ) -> Result<Self, PredictError> {
        let path = path.into();
        let n = artifact.feature_names.len();
        if n == 0 {
            return Err(PredictError::invalid_artifact(&path, "no feature names"));
        }

        let mut classes = Vec::with_capacity(artifact.classes.len());
        for label in &artifact.classes {
            let outcome = label
                .to_outcome(artifact.class_names.as_deref())
                .map_err(|reason| PredictError::invalid_artifact(&path, reason))?;
            if classes.contains(&outcome) {
                return Err(PredictError::invalid_artifact(
                    &path,
                    format!("class {outcome} appears twice"),
                ));
            }
            classes.push(outcome);
        }
        if classes.len() != Outcome::ALL.len() {
            return Err(PredictError::invalid_artifact(
                &path,
                format!("expected 3 classes, found {}", classes.len()),
            ));
        }

        let checked = match &artifact.estimator {
            ClassificationEstimator::Logistic(m) => m.check(n, classes.len()),
            ClassificationEstimator::Forest(f) => f.check(n, classes.len()),
        };
        checked.map_err(|reason| PredictError::invalid_artifact(&path, reason))?;

        Ok(Self {
            path,
            artifact,
            classes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &'static str {
        match self.artifact.estimator {
            ClassificationEstimator::Logistic(_) => "logistic",
            ClassificationEstimator::Forest(_) => "forest",
        }
    }
}

impl Classifier for OutcomeModel {
    fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    fn classes(&self) -> &[Outcome] {
        &self.classes
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        check_width(self.feature_names().len(), row.len())?;
        Ok(match &self.artifact.estimator {
            ClassificationEstimator::Logistic(m) => m.predict_proba(row),
            ClassificationEstimator::Forest(f) => f.predict_proba(row, self.classes.len()),
        })
    }
}

fn check_width(expected: usize, found: usize) -> Result<(), PredictError> {
    if expected != found {
        return Err(PredictError::WidthMismatch { expected, found });
    }
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, PredictError> {
    let raw = fs::read_to_string(path).map_err(|source| PredictError::MissingArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str::<T>(&raw).map_err(|source| PredictError::ArtifactFormat {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_value_model(path: &Path) -> Result<ValueModel, PredictError> {
    let model = ValueModel::from_artifact(path, read_artifact(path)?)?;
    info!(
        "loaded {} value model from {} ({} features)",
        model.kind(),
        path.display(),
        model.feature_names().len()
    );
    Ok(model)
}

pub fn load_outcome_model(path: &Path) -> Result<OutcomeModel, PredictError> {
    let model = OutcomeModel::from_artifact(path, read_artifact(path)?)?;
    info!(
        "loaded {} outcome model from {} ({} features, classes {:?})",
        model.kind(),
        path.display(),
        model.feature_names().len(),
        model.classes()
    );
    Ok(model)
}

pub fn load_scaler(path: &Path) -> Result<Scaler, PredictError> {
    let scaler: Scaler = read_artifact(path)?;
    if scaler.mean.len() != scaler.scale.len() {
        return Err(PredictError::invalid_artifact(
            path,
            format!(
                "scaler has {} means and {} scales",
                scaler.mean.len(),
                scaler.scale.len()
            ),
        ));
    }
    if let Some(names) = &scaler.feature_names
        && names.len() != scaler.mean.len()
    {
        return Err(PredictError::invalid_artifact(
            path,
            "scaler feature names disagree with its width",
        ));
    }
    info!("loaded scaler from {} ({} features)", path.display(), scaler.width());
    Ok(scaler)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub value_model: PathBuf,
    pub outcome_model: PathBuf,
    pub outcome_scaler: PathBuf,
}

impl ModelPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            value_model: dir.join(VALUE_MODEL_FILE),
            outcome_model: dir.join(OUTCOME_MODEL_FILE),
            outcome_scaler: dir.join(OUTCOME_SCALER_FILE),
        }
    }
}

/// Loads each artifact on first use and keeps it for the life of the process.
/// A failed load is not cached, so the next caller sees the same error.
#[derive(Debug)]
pub struct ModelStore {
    paths: ModelPaths,
    value: OnceCell<ValueModel>,
    outcome: OnceCell<OutcomeModel>,
    scaler: OnceCell<Scaler>,
}

impl ModelStore {
    pub fn new(paths: ModelPaths) -> Self {
        Self {
            paths,
            value: OnceCell::new(),
            outcome: OnceCell::new(),
            scaler: OnceCell::new(),
        }
    }

    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    pub fn value_model(&self) -> Result<&ValueModel, PredictError> {
        self.value
            .get_or_try_init(|| load_value_model(&self.paths.value_model))
    }

    pub fn outcome_model(&self) -> Result<&OutcomeModel, PredictError> {
        self.outcome
            .get_or_try_init(|| load_outcome_model(&self.paths.outcome_model))
    }

    pub fn scaler(&self) -> Result<&Scaler, PredictError> {
        self.scaler
            .get_or_try_init(|| load_scaler(&self.paths.outcome_scaler))
    }
}
