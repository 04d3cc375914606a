use std::path::PathBuf;

/// Failures surfaced by the inference pipeline. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("model artifact {path} is missing or unreadable: {source}")]
    MissingArtifact {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model artifact {path} could not be parsed: {source}")]
    ArtifactFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("model artifact {path} is inconsistent: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("no {table} row for team '{team}'")]
    MissingReferenceRow { table: &'static str, team: String },

    #[error("failed to read reference table {path}: {source}")]
    ReferenceTable { path: PathBuf, source: csv::Error },

    #[error("{table} table {path} has no '{column}' column")]
    MissingColumn {
        path: PathBuf,
        table: &'static str,
        column: &'static str,
    },

    #[error("field '{field}' is not a number: {raw:?}")]
    MalformedField { field: &'static str, raw: String },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("feature width mismatch: model expects {expected}, got {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("scaler column {index} is '{scaler}' but the classifier expects '{model}'")]
    ScalerMismatch {
        index: usize,
        scaler: String,
        model: String,
    },

    #[error("model produced a non-finite score ({value})")]
    NonFiniteScore { value: f64 },
}

impl PredictError {
    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
