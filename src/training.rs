//! Training step: encoded train table -> fitted forest + feature list

use crate::artifacts::{ModelArtifacts, ENCODING_FILE, TRAIN_FILE};
use crate::config::{TrainConfig, LABEL_COLUMN};
use crate::data::{class_counts, read_csv_bytes, split_features_and_target, to_matrix};
use crate::encoding::EncodingContract;
use crate::error::{PredictorError, Result};
use crate::features::FeatureList;
use crate::forest::RandomForestClassifier;
use crate::registry::{ArtifactStore, RepoId};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::info;

pub struct TrainingJob {
    config: TrainConfig,
}

impl TrainingJob {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Fit on an encoded table. The feature list is every non-label column in
    /// table order; any schema problem aborts with no partial output.
    pub fn fit(&self, train: &DataFrame, encoding: EncodingContract) -> Result<ModelArtifacts> {
        let (features_df, target) = split_features_and_target(train, LABEL_COLUMN)?;

        if let Some(bad) = target.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(PredictorError::InvalidData(format!(
                "'{}' must be 0 or 1, found {}",
                LABEL_COLUMN, bad
            )));
        }

        let counts = class_counts(train, LABEL_COLUMN)?;
        let features = FeatureList::from_frame(&features_df)?;
        let x = to_matrix(&features_df)?;

        let start = Instant::now();
        let mut model = RandomForestClassifier::new(self.config.forest.clone());
        model.fit(&x, &target)?;

        info!(
            rows = x.nrows(),
            features = features.len(),
            positives = counts.get(&1).copied().unwrap_or(0),
            negatives = counts.get(&0).copied().unwrap_or(0),
            trees = model.n_trees(),
            max_depth = ?self.config.forest.max_depth,
            seed = self.config.forest.seed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained random forest"
        );

        ModelArtifacts::new(model, features, encoding)
    }

    /// Fetch the prepared split from the dataset repo, fit, and publish to the model repo
    pub fn run(&self, store: &dyn ArtifactStore, dataset: &RepoId, model_repo: &RepoId) -> Result<ModelArtifacts> {
        let train = read_csv_bytes(store.fetch(dataset, TRAIN_FILE)?)?;
        let encoding = EncodingContract::from_json(&store.fetch(dataset, ENCODING_FILE)?)?;

        let artifacts = self.fit(&train, encoding)?;
        artifacts.publish(store, model_repo)?;
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use polars::prelude::*;

    fn small_job() -> TrainingJob {
        TrainingJob::new(TrainConfig {
            forest: ForestParams::default().with_n_estimators(10),
        })
    }

    fn encoded_table() -> DataFrame {
        df!(
            "Age" => &[25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0],
            "ProdTaken" => &[1i64, 1, 1, 1, 0, 0, 0, 0],
            "Passport" => &[1i64, 1, 1, 0, 0, 0, 1, 0]
        )
        .unwrap()
    }

    #[test]
    fn test_feature_list_excludes_label_and_keeps_order() {
        let artifacts = small_job()
            .fit(&encoded_table(), EncodingContract::default())
            .unwrap();
        assert_eq!(artifacts.features.names(), &["Age", "Passport"]);
        assert_eq!(artifacts.model.n_features(), 2);
        assert_eq!(artifacts.model.n_trees(), 10);
    }

    #[test]
    fn test_non_binary_label_aborts() {
        let df = df!("Age" => &[1.0, 2.0], "ProdTaken" => &[0i64, 2]).unwrap();
        let err = small_job()
            .fit(&df, EncodingContract::default())
            .unwrap_err();
        assert!(matches!(err, PredictorError::InvalidData(_)));
    }

    #[test]
    fn test_unencoded_column_aborts() {
        let df = df!("Gender" => &["Male", "Female"], "ProdTaken" => &[0i64, 1]).unwrap();
        let err = small_job()
            .fit(&df, EncodingContract::default())
            .unwrap_err();
        assert!(matches!(err, PredictorError::SchemaMismatch(_)));
    }

    #[test]
    fn test_missing_label_aborts() {
        let df = df!("Age" => &[1.0, 2.0]).unwrap();
        let err = small_job()
            .fit(&df, EncodingContract::default())
            .unwrap_err();
        assert!(matches!(err, PredictorError::SchemaMismatch(_)));
    }
}
