//! Categorical encoding contract
//!
//! Each text field maps its labels to integer codes `0..k` in alphabetical order.
//! The contract is fitted once during data preparation, published next to the
//! dataset and the model, and loaded by the dashboard, so training and serving
//! always share one mapping.

use crate::data::{categorical_columns, string_values};
use crate::error::{PredictorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Bumped whenever the meaning of the serialized form changes
pub const ENCODING_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingContract {
    version: u32,
    /// field -> labels sorted ascending; a label's code is its position
    fields: BTreeMap<String, Vec<String>>,
}

impl Default for EncodingContract {
    fn default() -> Self {
        Self {
            version: ENCODING_VERSION,
            fields: BTreeMap::new(),
        }
    }
}

impl EncodingContract {
    /// Build a contract from explicit label sets. Labels are sorted and deduplicated.
    pub fn from_fields<I, F, L>(fields: I) -> Self
    where
        I: IntoIterator<Item = (F, Vec<L>)>,
        F: Into<String>,
        L: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(field, labels)| {
                let sorted: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
                (field.into(), sorted.into_iter().collect())
            })
            .collect();
        Self {
            version: ENCODING_VERSION,
            fields,
        }
    }

    /// Fit one mapping per text column from the distinct non-null labels present
    pub fn fit(df: &DataFrame) -> Result<Self> {
        let mut fields = Vec::new();
        for name in categorical_columns(df) {
            let labels: Vec<String> = string_values(df, &name)?.into_iter().flatten().collect();
            fields.push((name, labels));
        }
        let contract = Self::from_fields(fields);
        info!(
            fields = contract.fields.len(),
            labels = contract.fields.values().map(Vec::len).sum::<usize>(),
            "Fitted encoding contract"
        );
        Ok(contract)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Labels of `field` in code order
    pub fn labels(&self, field: &str) -> Result<&[String]> {
        self.fields
            .get(field)
            .map(Vec::as_slice)
            .ok_or_else(|| PredictorError::SchemaMismatch(format!("no encoding for field '{}'", field)))
    }

    /// Code of `label` in `field`. Unknown labels are an error, never a default code.
    pub fn encode(&self, field: &str, label: &str) -> Result<u32> {
        let labels = self.labels(field)?;
        labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .map(|code| code as u32)
            .map_err(|_| PredictorError::UnknownCategory {
                field: field.to_string(),
                label: label.to_string(),
                expected: labels.join(", "),
            })
    }

    pub fn decode(&self, field: &str, code: u32) -> Option<&str> {
        self.fields.get(field)?.get(code as usize).map(String::as_str)
    }

    /// Replace every text column with its codes. Text columns the contract does
    /// not cover, nulls and unseen labels are all errors.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for name in categorical_columns(df) {
            if !self.contains_field(&name) {
                return Err(PredictorError::SchemaMismatch(format!(
                    "text column '{}' has no encoding",
                    name
                )));
            }
            let codes = string_values(df, &name)?
                .into_iter()
                .enumerate()
                .map(|(row, label)| {
                    let label = label.ok_or_else(|| {
                        PredictorError::InvalidData(format!("missing '{}' at row {}", name, row))
                    })?;
                    Ok(self.encode(&name, &label)? as i64)
                })
                .collect::<Result<Vec<i64>>>()?;
            out.with_column(Series::new(name.as_str().into(), codes))?;
        }
        Ok(out)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let contract: Self = serde_json::from_slice(bytes)?;
        if contract.version != ENCODING_VERSION {
            return Err(PredictorError::SchemaMismatch(format!(
                "encoding artifact version {} is not supported (expected {})",
                contract.version, ENCODING_VERSION
            )));
        }
        for (field, labels) in &contract.fields {
            if labels.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PredictorError::SchemaMismatch(format!(
                    "labels of '{}' are not strictly sorted",
                    field
                )));
            }
        }
        Ok(contract)
    }
}
