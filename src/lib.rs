//! Wellness tourism package purchase predictor
//!
//! Pipeline: `prep` cleans and encodes the raw customer table, `train` fits a
//! random forest and publishes it, `deploy` pushes the dashboard to a hosting
//! space, and `serve` runs the dashboard that scores one customer at a time.

pub mod artifacts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod deploy;
pub mod encoding;
pub mod error;
pub mod features;
pub mod forest;
pub mod prediction;
pub mod prep;
pub mod registry;
pub mod request;
pub mod training;

pub use artifacts::ModelArtifacts;
pub use encoding::EncodingContract;
pub use error::{PredictorError, Result};
pub use features::FeatureList;
pub use forest::{ForestParams, RandomForestClassifier};
pub use prediction::{FeatureImportance, Potential, Prediction, Predictor};
pub use registry::{open_store, ArtifactStore, HubStore, LocalStore, RepoFile, RepoId};
pub use request::{CustomerProfile, YesNo};
pub use training::TrainingJob;
