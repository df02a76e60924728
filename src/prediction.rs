//! Prediction and explanation
//!
//! The explanation is the model's *global* impurity-based importance ranking.
//! It describes what the forest relies on overall, not why this particular
//! customer got this particular score.

use crate::artifacts::ModelArtifacts;
use crate::error::{PredictorError, Result};
use crate::features::FeatureList;
use crate::request::CustomerProfile;
use serde::Serialize;
use tracing::debug;

/// Probabilities strictly above this are "High Potential"
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Number of features shown in the importance chart
pub const TOP_FEATURES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Potential {
    High,
    Low,
}

impl Potential {
    pub fn label(self) -> &'static str {
        match self {
            Potential::High => "High Potential",
            Potential::Low => "Low Potential",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Purchase probability in [0, 1]
    pub probability: f64,
    pub potential: Potential,
    /// Probability of the predicted outcome: `p` when high, `1 - p` when low
    pub confidence: f64,
}

impl Prediction {
    pub fn from_probability(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictorError::InvalidData(format!(
                "probability {} outside [0, 1]",
                probability
            )));
        }
        let (potential, confidence) = if probability > DECISION_THRESHOLD {
            (Potential::High, probability)
        } else {
            (Potential::Low, 1.0 - probability)
        };
        Ok(Self {
            probability,
            potential,
            confidence,
        })
    }

    /// Status line shown under the gauge
    pub fn message(&self) -> String {
        match self.potential {
            Potential::High => format!(
                "High Potential: Likely to purchase. (Confidence: {:.2}%)",
                self.confidence * 100.0
            ),
            Potential::Low => format!(
                "Low Potential: Unlikely to purchase. (Confidence: {:.2}%)",
                self.confidence * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// The `k` most important features, sorted ascending by importance (largest last)
pub fn top_importances(features: &FeatureList, importances: &[f64], k: usize) -> Result<Vec<FeatureImportance>> {
    if features.len() != importances.len() {
        return Err(PredictorError::SchemaMismatch(format!(
            "{} feature names but {} importance scores",
            features.len(),
            importances.len()
        )));
    }

    let mut ranked: Vec<FeatureImportance> = features
        .names()
        .iter()
        .zip(importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| a.importance.total_cmp(&b.importance));

    let skip = ranked.len().saturating_sub(k);
    Ok(ranked.split_off(skip))
}

/// Read-only view over loaded artifacts, shared by every dashboard request
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: ModelArtifacts,
}

impl Predictor {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    pub fn predict(&self, profile: &CustomerProfile) -> Result<Prediction> {
        let row = profile.to_row(&self.artifacts.encoding, &self.artifacts.features)?;
        let probability = self.artifacts.model.predict_positive(&row)?[0];
        debug!(probability, "Scored customer profile");
        Prediction::from_probability(probability)
    }

    pub fn explain(&self) -> Result<Vec<FeatureImportance>> {
        top_importances(
            &self.artifacts.features,
            self.artifacts.model.feature_importances()?,
            TOP_FEATURES,
        )
    }
}
