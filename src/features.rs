//! Feature list and feature alignment
//!
//! The feature list is the ordered set of columns the model was fitted on. At
//! inference time it is the only authority on column order.

use crate::data::column_names;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureList(Vec<String>);

impl FeatureList {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(PredictorError::SchemaMismatch("feature list is empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(PredictorError::SchemaMismatch(format!("duplicate feature '{}'", dup)));
        }
        Ok(Self(names))
    }

    /// Column names of a feature frame, in frame order
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        Self::new(column_names(df))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    /// Order `values` by the feature list. Position `i` holds the value of
    /// feature `i`; entries the model does not use are ignored.
    pub fn align(&self, values: &HashMap<String, f64>) -> Result<Array1<f64>> {
        self.0
            .iter()
            .map(|name| {
                values.get(name).copied().ok_or_else(|| {
                    let mut available: Vec<&str> = values.keys().map(String::as_str).collect();
                    available.sort_unstable();
                    PredictorError::MissingFeature {
                        feature: name.clone(),
                        available: available.join(", "),
                    }
                })
            })
            .collect()
    }

    /// [`align`](Self::align) as a one-row matrix ready for the model
    pub fn align_row(&self, values: &HashMap<String, f64>) -> Result<Array2<f64>> {
        let row = self.align(values)?;
        let n = row.len();
        row.into_shape_with_order((1, n))
            .map_err(|e| PredictorError::SchemaMismatch(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let names: Vec<String> = serde_json::from_slice(bytes)?;
        Self::new(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn features() -> FeatureList {
        FeatureList::new(vec!["Age".into(), "CityTier".into(), "MonthlyIncome".into()]).unwrap()
    }

    #[test]
    fn test_align_follows_feature_order() {
        let values: HashMap<String, f64> = [
            ("MonthlyIncome".to_string(), 25000.0),
            ("Age".to_string(), 30.0),
            ("CityTier".to_string(), 2.0),
            ("Unused".to_string(), 9.0),
        ]
        .into_iter()
        .collect();

        let row = features().align_row(&values).unwrap();
        assert_eq!(row.dim(), (1, 3));
        assert_eq!(row.row(0).to_vec(), vec![30.0, 2.0, 25000.0]);
    }

    #[test]
    fn test_missing_feature_is_reported() {
        let values: HashMap<String, f64> = [("Age".to_string(), 30.0)].into_iter().collect();
        match features().align(&values).unwrap_err() {
            PredictorError::MissingFeature { feature, available } => {
                assert_eq!(feature, "CityTier");
                assert_eq!(available, "Age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(FeatureList::new(vec![]).is_err());
        assert!(FeatureList::new(vec!["Age".into(), "Age".into()]).is_err());
    }

    #[test]
    fn test_json_is_plain_array() {
        let json = features().to_json().unwrap();
        let parsed: Vec<String> = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, vec!["Age", "CityTier", "MonthlyIncome"]);
        assert_eq!(FeatureList::from_json(&json).unwrap(), features());
    }

    proptest! {
        #[test]
        fn prop_alignment_ignores_insertion_order(
            names in prop::collection::hash_set("[A-Z][a-z]{2,8}", 1..15),
            seed in any::<u64>(),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let list = FeatureList::new(names.clone()).unwrap();

            // insert in a seed-dependent rotated order
            let shift = (seed as usize) % names.len();
            let mut values = HashMap::new();
            for (i, name) in names.iter().enumerate().cycle().skip(shift).take(names.len()) {
                values.insert(name.clone(), i as f64);
            }

            let row = list.align(&values).unwrap();
            for (i, v) in row.iter().enumerate() {
                prop_assert_eq!(*v, i as f64);
            }
        }
    }
}
