//! CSV loading, column extraction and exploratory summaries using Polars

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::DataError;

/// Feature matrix with a binary target, as used by the classifiers
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub feature_names: Vec<String>,
    /// Raw feature values (n_rows, n_features)
    pub records: Array2<f64>,
    pub targets: Array1<bool>,
}

/// Feature matrix without targets, as used by clustering
#[derive(Debug, Clone)]
pub struct FeatureData {
    pub feature_names: Vec<String>,
    /// Raw feature values (n_rows, n_features)
    pub records: Array2<f64>,
}

/// Describe-style statistics for a numeric column
#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1)
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Per-column exploration result
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub nulls: usize,
    pub numeric: Option<NumericStats>,
    /// Value counts for non-numeric columns, sorted by value
    pub categories: Option<Vec<(String, usize)>>,
}

/// Load a CSV file with a header row into a DataFrame
pub fn load_csv(path: impl AsRef<Path>) -> crate::Result<DataFrame> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if df.height() == 0 {
        return Err(DataError::Empty.into());
    }

    debug!(rows = df.height(), columns = df.width(), "loaded {}", path.display());
    Ok(df)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a Series> {
    df.column(name).map_err(|_| {
        let available = df
            .get_columns()
            .iter()
            .map(|s| s.name().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::Error::from(DataError::MissingColumn {
            column: name.to_string(),
            available,
        })
    })
}

/// Extract a numeric column as f64, rejecting nulls and non-numeric dtypes
pub fn column_values(df: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    let series = column(df, name)?;

    if !series.dtype().is_numeric() {
        return Err(DataError::NonNumeric {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        }
        .into());
    }

    let nulls = series.null_count();
    if nulls > 0 {
        return Err(DataError::MissingValues {
            column: name.to_string(),
            count: nulls,
        }
        .into());
    }

    let values = series
        .cast(&DataType::Float64)?
        .f64()?
        .into_no_null_iter()
        .collect();
    Ok(values)
}

/// Build a (n_rows, n_columns) matrix from the named columns in order
pub fn numeric_matrix(df: &DataFrame, columns: &[String]) -> crate::Result<Array2<f64>> {
    if columns.is_empty() {
        return Err(DataError::InvalidParameter("no feature columns selected".to_string()).into());
    }

    let extracted = columns
        .iter()
        .map(|name| column_values(df, name))
        .collect::<crate::Result<Vec<_>>>()?;

    let n_rows = df.height();
    let n_cols = extracted.len();
    let matrix = Array2::from_shape_fn((n_rows, n_cols), |(i, j)| extracted[j][i]);
    Ok(matrix)
}

/// Read a 0/1 column as a boolean target
pub fn binary_target(df: &DataFrame, name: &str) -> crate::Result<Array1<bool>> {
    let values = column_values(df, name)?;
    values
        .into_iter()
        .map(|v| {
            if v == 1.0 {
                Ok(true)
            } else if v == 0.0 {
                Ok(false)
            } else {
                Err(anyhow::Error::from(DataError::InvalidLabel {
                    column: name.to_string(),
                    value: v,
                }))
            }
        })
        .collect()
}

/// Load features and a binary target from a CSV file
pub fn load_labeled(
    path: impl AsRef<Path>,
    features: &[String],
    target: &str,
) -> crate::Result<LabeledData> {
    let df = load_csv(path)?;
    let records = numeric_matrix(&df, features)?;
    let targets = binary_target(&df, target)?;

    Ok(LabeledData {
        feature_names: features.to_vec(),
        records,
        targets,
    })
}

/// Load feature columns from a CSV file
pub fn load_features(path: impl AsRef<Path>, features: &[String]) -> crate::Result<FeatureData> {
    let df = load_csv(path)?;
    let records = numeric_matrix(&df, features)?;

    Ok(FeatureData {
        feature_names: features.to_vec(),
        records,
    })
}

/// Summarize every column: dtype, null count and either numeric statistics
/// or categorical value counts
pub fn summarize(df: &DataFrame) -> crate::Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::with_capacity(df.width());

    for series in df.get_columns() {
        let name = series.name().to_string();
        let dtype = series.dtype().to_string();
        let nulls = series.null_count();

        let (numeric, categories) = if series.dtype().is_numeric() {
            let values: Vec<f64> = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .flatten()
                .collect();
            (numeric_stats(&values), None)
        } else {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for value in series.cast(&DataType::String)?.str()?.into_iter().flatten() {
                *counts.entry(value.to_string()).or_default() += 1;
            }
            (None, Some(counts.into_iter().collect()))
        };

        summaries.push(ColumnSummary {
            name,
            dtype,
            nulls,
            numeric,
            categories,
        });
    }

    Ok(summaries)
}

/// Describe-style statistics; `None` for an empty column
pub fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (ss / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(NumericStats {
        count,
        mean,
        std,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear-interpolation quantile over sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "User ID,Gender,Age,EstimatedSalary,Purchased").unwrap();
        writeln!(file, "15624510,Male,19,19000,0").unwrap();
        writeln!(file, "15810944,Male,35,20000,0").unwrap();
        writeln!(file, "15668575,Female,26,43000,0").unwrap();
        writeln!(file, "15603246,Female,27,57000,0").unwrap();
        writeln!(file, "15694829,Female,32,150000,1").unwrap();
        writeln!(file, "15733883,Male,47,25000,1").unwrap();
        file
    }

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_load_labeled() {
        let file = create_test_csv();
        let data = load_labeled(file.path(), &names(&["Age", "EstimatedSalary"]), "Purchased")
            .unwrap();

        assert_eq!(data.records.shape(), &[6, 2]);
        assert_eq!(data.records[[0, 0]], 19.0);
        assert_eq!(data.records[[4, 1]], 150000.0);
        assert_eq!(data.targets.iter().filter(|&&t| t).count(), 2);
    }

    #[test]
    fn test_missing_column() {
        let file = create_test_csv();
        let err = load_features(file.path(), &names(&["Age", "Income"])).unwrap_err();

        match err.downcast_ref::<DataError>() {
            Some(DataError::MissingColumn { column, available }) => {
                assert_eq!(column, "Income");
                assert!(available.contains("EstimatedSalary"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_feature() {
        let file = create_test_csv();
        let err = load_features(file.path(), &names(&["Gender"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_nulls_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Age,Score").unwrap();
        writeln!(file, "20,1").unwrap();
        writeln!(file, ",2").unwrap();
        writeln!(file, "40,3").unwrap();

        let df = load_csv(file.path()).unwrap();
        let err = column_values(&df, "Age").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingValues {
                column: "Age".to_string(),
                count: 1
            })
        );
    }

    #[test]
    fn test_invalid_label() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Age,Purchased").unwrap();
        writeln!(file, "20,1").unwrap();
        writeln!(file, "30,2").unwrap();

        let df = load_csv(file.path()).unwrap();
        assert!(binary_target(&df, "Purchased").is_err());
    }

    #[test]
    fn test_summarize() {
        let file = create_test_csv();
        let df = load_csv(file.path()).unwrap();
        let summary = summarize(&df).unwrap();

        assert_eq!(summary.len(), 5);
        assert!(summary.iter().all(|c| c.nulls == 0));

        let gender = summary.iter().find(|c| c.name == "Gender").unwrap();
        assert!(gender.numeric.is_none());
        assert_eq!(
            gender.categories.as_ref().unwrap(),
            &vec![("Female".to_string(), 3), ("Male".to_string(), 3)]
        );

        let age = summary.iter().find(|c| c.name == "Age").unwrap();
        let stats = age.numeric.as_ref().unwrap();
        assert_eq!(stats.count, 6);
        assert_eq!(stats.min, 19.0);
        assert_eq!(stats.max, 47.0);
    }

    #[test]
    fn test_numeric_stats_quartiles() {
        let stats = numeric_stats(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert!(numeric_stats(&[]).is_none());
    }
}
