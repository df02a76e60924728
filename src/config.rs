//! Runtime configuration
//!
//! Defaults come from environment variables and are overridden by CLI flags.

use std::path::PathBuf;

use crate::forest::ForestParams;

pub const DEFAULT_USERNAME: &str = "divyabuni";
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

pub const DATASET_REPO_SUFFIX: &str = "tourism-package-dataset";
pub const MODEL_REPO_SUFFIX: &str = "tourism-package-model";
pub const SPACE_REPO_SUFFIX: &str = "tourism-package-predictor";

/// Name of the outcome column in the tourism dataset
pub const LABEL_COLUMN: &str = "ProdTaken";

/// Where artifacts are published to and fetched from
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub username: String,
    pub token: Option<String>,
    pub endpoint: String,
    /// When set, a local directory replaces the Hub
    pub local_dir: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            username: std::env::var("HF_USERNAME").unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
            token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            endpoint: std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            local_dir: std::env::var("REGISTRY_DIR").ok().map(PathBuf::from),
        }
    }
}

impl RegistryConfig {
    pub fn dataset_repo(&self) -> String {
        format!("{}/{}", self.username, DATASET_REPO_SUFFIX)
    }

    pub fn model_repo(&self) -> String {
        format!("{}/{}", self.username, MODEL_REPO_SUFFIX)
    }

    pub fn space_repo(&self) -> String {
        format!("{}/{}", self.username, SPACE_REPO_SUFFIX)
    }
}

/// Settings for the data preparation step
#[derive(Debug, Clone)]
pub struct PrepConfig {
    /// File name of the raw CSV inside the dataset repo
    pub raw_file: String,
    pub test_size: f64,
    pub seed: u64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            raw_file: "tourism.csv".to_string(),
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Settings for the training step
#[derive(Debug, Clone, Default)]
pub struct TrainConfig {
    pub forest: ForestParams,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7860),
        }
    }
}
