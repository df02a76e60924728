//! Published artifacts and their file names in the registry

use crate::encoding::EncodingContract;
use crate::error::{PredictorError, Result};
use crate::features::FeatureList;
use crate::forest::RandomForestClassifier;
use crate::registry::{ArtifactStore, RepoFile, RepoId};
use tracing::info;

pub const MODEL_FILE: &str = "model.bin";
pub const FEATURES_FILE: &str = "features.json";
pub const ENCODING_FILE: &str = "encoding.json";
pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";

/// Everything the dashboard needs: the fitted model, its column order, and the
/// label codes it was trained with. Immutable once published.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: RandomForestClassifier,
    pub features: FeatureList,
    pub encoding: EncodingContract,
}

impl ModelArtifacts {
    pub fn new(model: RandomForestClassifier, features: FeatureList, encoding: EncodingContract) -> Result<Self> {
        if model.n_features() != features.len() {
            return Err(PredictorError::SchemaMismatch(format!(
                "model was fitted on {} features but the feature list has {}",
                model.n_features(),
                features.len()
            )));
        }
        Ok(Self { model, features, encoding })
    }

    pub fn to_files(&self) -> Result<Vec<RepoFile>> {
        Ok(vec![
            RepoFile::new(MODEL_FILE, self.model.to_bytes()?),
            RepoFile::new(FEATURES_FILE, self.features.to_json()?),
            RepoFile::new(ENCODING_FILE, self.encoding.to_json()?),
        ])
    }

    pub fn publish(&self, store: &dyn ArtifactStore, repo: &RepoId) -> Result<()> {
        store.create_repo(repo, None)?;
        store.upload(repo, &self.to_files()?, "Upload model, feature list and encoding")?;
        info!(repo = %repo, trees = self.model.n_trees(), features = self.features.len(), "Published model artifacts");
        Ok(())
    }

    pub fn fetch(store: &dyn ArtifactStore, repo: &RepoId) -> Result<Self> {
        let model = RandomForestClassifier::from_bytes(&store.fetch(repo, MODEL_FILE)?)?;
        let features = FeatureList::from_json(&store.fetch(repo, FEATURES_FILE)?)?;
        let encoding = EncodingContract::from_json(&store.fetch(repo, ENCODING_FILE)?)?;
        let artifacts = Self::new(model, features, encoding)?;
        info!(repo = %repo, trees = artifacts.model.n_trees(), features = artifacts.features.len(), "Loaded model artifacts");
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use crate::registry::LocalStore;
    use ndarray::array;

    fn fitted(n_trees: usize) -> RandomForestClassifier {
        let x = array![[1.0, 0.0], [2.0, 1.0], [8.0, 0.0], [9.0, 1.0]];
        let mut model = RandomForestClassifier::new(ForestParams::default().with_n_estimators(n_trees));
        model.fit(&x, &[0.0, 0.0, 1.0, 1.0]).unwrap();
        model
    }

    fn features(names: &[&str]) -> FeatureList {
        FeatureList::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_feature_count_must_match_model() {
        let err = ModelArtifacts::new(fitted(3), features(&["Age"]), EncodingContract::default()).unwrap_err();
        assert!(matches!(err, PredictorError::SchemaMismatch(_)));
    }

    #[test]
    fn test_publish_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let repo = RepoId::model("alice/tourism-package-model");
        let encoding = EncodingContract::from_fields([("Gender", vec!["Male", "Female"])]);

        let artifacts = ModelArtifacts::new(fitted(4), features(&["Age", "Passport"]), encoding).unwrap();
        let paths: Vec<String> = artifacts.to_files().unwrap().into_iter().map(|f| f.path).collect();
        assert_eq!(paths, vec![MODEL_FILE, FEATURES_FILE, ENCODING_FILE]);

        artifacts.publish(&store, &repo).unwrap();
        let loaded = ModelArtifacts::fetch(&store, &repo).unwrap();
        assert_eq!(loaded.features, artifacts.features);
        assert_eq!(loaded.encoding, artifacts.encoding);
        assert_eq!(loaded.model.n_trees(), 4);
    }
}
