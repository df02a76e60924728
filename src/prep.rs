//! Data preparation step: raw tourism export -> encoded, split, published tables

use crate::artifacts::{ENCODING_FILE, TEST_FILE, TRAIN_FILE};
use crate::config::{PrepConfig, LABEL_COLUMN};
use crate::data::{clean_raw, impute_missing, read_csv_bytes, train_test_split, write_csv_bytes};
use crate::encoding::EncodingContract;
use crate::error::Result;
use crate::registry::{ArtifactStore, RepoFile, RepoId};
use polars::prelude::DataFrame;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: DataFrame,
    pub test: DataFrame,
    pub encoding: EncodingContract,
}

impl PreparedData {
    pub fn to_files(&mut self) -> Result<Vec<RepoFile>> {
        Ok(vec![
            RepoFile::new(TRAIN_FILE, write_csv_bytes(&mut self.train)?),
            RepoFile::new(TEST_FILE, write_csv_bytes(&mut self.test)?),
            RepoFile::new(ENCODING_FILE, self.encoding.to_json()?),
        ])
    }

    /// Upload train/test tables and the encoding contract to the dataset repo
    pub fn publish(&mut self, store: &dyn ArtifactStore, repo: &RepoId) -> Result<()> {
        store.upload(repo, &self.to_files()?, "Upload prepared train/test split and encoding")?;
        info!(
            repo = %repo,
            train_rows = self.train.height(),
            test_rows = self.test.height(),
            "Published prepared data"
        );
        Ok(())
    }
}

/// Clean, impute, encode and split a raw frame
pub fn prepare(raw: DataFrame, config: &PrepConfig) -> Result<PreparedData> {
    let df = impute_missing(clean_raw(raw)?)?;
    let encoding = EncodingContract::fit(&df)?;
    let encoded = encoding.transform(&df)?;
    let (train, test) = train_test_split(&encoded, LABEL_COLUMN, config.test_size, config.seed)?;
    Ok(PreparedData { train, test, encoding })
}

/// Fetch the raw CSV from the dataset repo, prepare it, and publish the results back
pub fn run_prep(store: &dyn ArtifactStore, repo: &RepoId, config: &PrepConfig) -> Result<PreparedData> {
    info!(repo = %repo, file = %config.raw_file, "Starting data preparation");

    let raw = read_csv_bytes(store.fetch(repo, &config.raw_file)?)?;
    let mut prepared = prepare(raw, config)?;

    prepared.publish(store, repo)?;
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{categorical_columns, column_names, numeric_values};
    use polars::prelude::*;

    fn raw() -> DataFrame {
        let n = 20;
        df!(
            "Unnamed: 0" => (0..n).collect::<Vec<i64>>(),
            "CustomerID" => (0..n).map(|i| 200000 + i).collect::<Vec<i64>>(),
            "ProdTaken" => (0..n).map(|i| (i % 4 == 0) as i64).collect::<Vec<i64>>(),
            "Age" => (0..n).map(|i| if i == 3 { None } else { Some(20.0 + i as f64) }).collect::<Vec<_>>(),
            "Gender" => (0..n).map(|i| ["Male", "Female", "Fe Male"][(i % 3) as usize]).collect::<Vec<_>>(),
            "MaritalStatus" => (0..n).map(|i| ["Married", "Unmarried", "Divorced", "Single"][(i % 4) as usize]).collect::<Vec<_>>()
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_produces_encoded_split() {
        let prepared = prepare(raw(), &PrepConfig::default()).unwrap();

        assert_eq!(prepared.train.height() + prepared.test.height(), 20);
        assert_eq!(prepared.test.height(), 4);
        assert!(categorical_columns(&prepared.train).is_empty());
        assert_eq!(
            column_names(&prepared.train),
            vec!["ProdTaken", "Age", "Gender", "MaritalStatus"]
        );

        // typos folded into the canonical labels before fitting
        assert_eq!(prepared.encoding.labels("Gender").unwrap(), &["Female", "Male"]);
        assert_eq!(
            prepared.encoding.labels("MaritalStatus").unwrap(),
            &["Divorced", "Married", "Single"]
        );

        let ages = numeric_values(&prepared.train, "Age").unwrap();
        assert!(ages.iter().all(Option::is_some));
    }

    #[test]
    fn test_run_prep_publishes_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::registry::LocalStore::new(dir.path());
        let repo = RepoId::dataset("alice/tourism-package-dataset");

        let mut frame = raw();
        let csv = write_csv_bytes(&mut frame).unwrap();
        store.upload(&repo, &[RepoFile::new("tourism.csv", csv)], "raw").unwrap();

        run_prep(&store, &repo, &PrepConfig::default()).unwrap();

        let train = read_csv_bytes(store.fetch(&repo, TRAIN_FILE).unwrap()).unwrap();
        assert_eq!(train.height(), 16);
        let encoding = EncodingContract::from_json(&store.fetch(&repo, ENCODING_FILE).unwrap()).unwrap();
        assert!(encoding.contains_field("Gender"));
    }
}
