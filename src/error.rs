//! Error types shared by the prep, training and serving steps

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    /// The registry could not be reached or refused the request
    #[error("registry unavailable ({repo}/{file}): {reason}")]
    RegistryUnavailable {
        repo: String,
        file: String,
        reason: String,
    },

    /// A table or artifact does not have the shape the pipeline expects
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A name from the published feature list has no value in the request
    #[error("feature '{feature}' is required by the model but missing from the input (have: {available})")]
    MissingFeature { feature: String, available: String },

    #[error("unknown {field} label '{label}' (expected one of: {expected})")]
    UnknownCategory {
        field: String,
        label: String,
        expected: String,
    },

    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("model is not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PredictorError {
    /// True for errors caused by what the user typed rather than by the deployment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictorError::UnknownCategory { .. } | PredictorError::OutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
