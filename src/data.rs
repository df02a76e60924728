//! Tabular data helpers: CSV in/out, cleaning, imputation, splitting.

use crate::error::{PredictorError, Result};
use ndarray::Array2;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Identifier columns that carry no signal
pub const DROPPED_COLUMNS: [&str; 1] = ["CustomerID"];

/// Header prefix some exporters give an unnamed index column
const UNNAMED_PREFIX: &str = "Unnamed:";

/// Known label typos in the raw export: (column, wrong label, correct label)
pub const LABEL_FIXES: [(&str, &str, &str); 2] = [
    ("Gender", "Fe Male", "Female"),
    ("MaritalStatus", "Unmarried", "Single"),
];

pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    info!(rows = df.height(), columns = df.width(), "Loaded CSV");
    debug!("{:?}", df.head(Some(5)));

    Ok(df)
}

pub fn load_csv_file(path: &Path) -> Result<DataFrame> {
    read_csv_bytes(std::fs::read(path)?)
}

pub fn write_csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(df)?;
    Ok(buf)
}

/// Names of the string-typed columns, in frame order
pub fn categorical_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().to_string())
        .collect()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.as_materialized_series();
    if column.dtype() == &DataType::String {
        return Err(PredictorError::SchemaMismatch(format!(
            "column '{}' holds text; encode it before use",
            name
        )));
    }
    let values = column.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.as_materialized_series();
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// A leading column with a blank or `Unnamed: N` header is a written-out row index.
fn is_index_header(name: &str) -> bool {
    name.trim().is_empty() || name.starts_with(UNNAMED_PREFIX)
}

/// Drop the index/identifier columns (absent ones are ignored) and fix label typos.
pub fn clean_raw(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    let leading = df.get_column_names().first().map(|s| s.to_string());
    if let Some(name) = leading.filter(|n| is_index_header(n)) {
        df = df.drop(&name)?;
        debug!(column = %name, "Dropped index column");
    }
    for name in DROPPED_COLUMNS {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
        }
    }

    for (column, wrong, right) in LABEL_FIXES {
        let is_text = df
            .column(column)
            .map(|c| c.dtype() == &DataType::String)
            .unwrap_or(false);
        if !is_text {
            continue;
        }

        let mut fixed = 0usize;
        let values: Vec<Option<String>> = string_values(&df, column)?
            .into_iter()
            .map(|v| {
                v.map(|s| {
                    if s == wrong {
                        fixed += 1;
                        right.to_string()
                    } else {
                        s
                    }
                })
            })
            .collect();
        df.with_column(Series::new(column.into(), values))?;
        debug!(column, wrong, right, fixed, "Fixed label typo");
    }

    info!(rows = df.height(), columns = df.width(), "Cleaned raw data");
    Ok(df)
}

/// Fill missing values: numeric columns with their median, text columns with
/// their most frequent label (ties go to the alphabetically first label).
pub fn impute_missing(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    for name in column_names(&df) {
        let nulls = df.column(&name)?.null_count();
        if nulls == 0 {
            continue;
        }

        if df.column(&name)?.dtype() == &DataType::String {
            let values = string_values(&df, &name)?;
            let fill = most_frequent(&values).ok_or_else(|| {
                PredictorError::InvalidData(format!("column '{}' has no values at all", name))
            })?;
            let filled: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| fill.clone()))
                .collect();
            df.with_column(Series::new(name.as_str().into(), filled))?;
            debug!(column = %name, nulls, fill = %fill, "Imputed text column");
        } else {
            let values = numeric_values(&df, &name)?;
            let fill = median(&values).ok_or_else(|| {
                PredictorError::InvalidData(format!("column '{}' has no values at all", name))
            })?;
            let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
            df.with_column(Series::new(name.as_str().into(), filled))?;
            debug!(column = %name, nulls, fill, "Imputed numeric column");
        }
    }
    Ok(df)
}

fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    Some(if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    })
}

fn most_frequent(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    // BTreeMap iterates alphabetically, and max_by_key keeps the last maximum,
    // so iterate in reverse to let the first label win ties.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(label, _)| label.to_string())
}

/// Stratified, seeded train/test split on `label`.
///
/// Each class contributes `round(n_class * test_size)` rows to the test set.
pub fn train_test_split(
    df: &DataFrame,
    label: &str,
    test_size: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PredictorError::InvalidData(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if df.get_column_index(label).is_none() {
        return Err(PredictorError::SchemaMismatch(format!("label column '{}' not found", label)));
    }

    let mut by_class: BTreeMap<i64, Vec<IdxSize>> = BTreeMap::new();
    for (row, value) in numeric_values(df, label)?.into_iter().enumerate() {
        let value = value.ok_or_else(|| {
            PredictorError::InvalidData(format!("missing '{}' at row {}", label, row))
        })?;
        by_class.entry(value as i64).or_default().push(row as IdxSize);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for rows in by_class.values_mut() {
        rows.shuffle(&mut rng);
        let n_test = (rows.len() as f64 * test_size).round() as usize;
        test_indices.extend_from_slice(&rows[..n_test]);
        train_indices.extend_from_slice(&rows[n_test..]);
    }

    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    let train_ca = IdxCa::from_vec("idx".into(), train_indices);
    let test_ca = IdxCa::from_vec("idx".into(), test_indices);

    let train_df = df.take(&train_ca)?;
    let test_df = df.take(&test_ca)?;

    info!(train_rows = train_df.height(), test_rows = test_df.height(), "Split data");
    Ok((train_df, test_df))
}

/// Separate the label column from the features; the features keep frame order.
pub fn split_features_and_target(df: &DataFrame, label: &str) -> Result<(DataFrame, Vec<f64>)> {
    if df.get_column_index(label).is_none() {
        return Err(PredictorError::SchemaMismatch(format!("label column '{}' not found", label)));
    }

    let target = numeric_values(df, label)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| PredictorError::InvalidData(format!("missing '{}' at row {}", label, row)))
        })
        .collect::<Result<Vec<f64>>>()?;
    let features = df.drop(label)?;

    Ok((features, target))
}

/// Row-major matrix of a fully numeric, null-free frame
pub fn to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(df.width());
    for name in column_names(df) {
        let values = numeric_values(df, &name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| PredictorError::InvalidData(format!("missing '{}' at row {}", name, row)))
            })
            .collect::<Result<Vec<f64>>>()?;
        columns.push(values);
    }

    Ok(Array2::from_shape_fn((df.height(), columns.len()), |(i, j)| columns[j][i]))
}

/// Per-class row counts of a numeric label column
pub fn class_counts(df: &DataFrame, label: &str) -> Result<HashMap<i64, usize>> {
    let mut counts = HashMap::new();
    for v in numeric_values(df, label)?.into_iter().flatten() {
        *counts.entry(v as i64).or_insert(0) += 1;
    }
    Ok(counts)
}
