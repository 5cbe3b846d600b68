//! Feature schema: which table columns feed the booster and how they become numbers

use crate::datasets::timestamp_seconds;
use crate::error::{FraudBenchError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a column's values are turned into `f64`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Cast to Float64; null is NaN
    Numeric,
    /// RFC 3339 text as epoch seconds
    Timestamp,
    /// Text mapped to codes learned at fit time; unseen or null is NaN
    Categorical { levels: BTreeMap<String, u32> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// Whether a scoring table must carry exactly the training feature columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeCheck {
    /// Any difference in the feature column set is an error
    Strict,
    /// Align by name: missing columns are all-NaN, extra columns are ignored
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    target: String,
    columns: Vec<FeatureColumn>,
}

fn text_values(col: &Column) -> Result<Vec<Option<String>>> {
    Ok(col
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

impl FeatureSchema {
    /// Every column except `target`, in table order
    pub fn infer(df: &DataFrame, target: &str) -> Result<Self> {
        let mut columns = Vec::new();
        for col in df.get_columns() {
            let name = col.name().to_string();
            if name == target {
                continue;
            }
            let kind = match col.dtype() {
                DataType::String => {
                    let values: Vec<String> = text_values(col)?.into_iter().flatten().collect();
                    if !values.is_empty() && values.iter().all(|v| timestamp_seconds(v).is_some()) {
                        FeatureKind::Timestamp
                    } else {
                        let distinct: BTreeSet<String> = values.into_iter().collect();
                        let levels = distinct
                            .into_iter()
                            .enumerate()
                            .map(|(code, level)| (level, code as u32))
                            .collect();
                        FeatureKind::Categorical { levels }
                    }
                }
                _ => FeatureKind::Numeric,
            };
            columns.push(FeatureColumn { name, kind });
        }
        Ok(Self { target: target.to_string(), columns })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn check_shape(&self, df: &DataFrame) -> Result<()> {
        let expected: BTreeSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let actual: BTreeSet<&str> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.as_str())
            .filter(|s| *s != self.target)
            .collect();
        if expected != actual {
            return Err(FraudBenchError::ShapeError {
                expected: format!("{} feature columns {:?}", expected.len(), expected),
                actual: format!("{} feature columns {:?}", actual.len(), actual),
            });
        }
        Ok(())
    }

    fn column_values(&self, feature: &FeatureColumn, col: &Column) -> Result<Vec<f64>> {
        let values = match &feature.kind {
            FeatureKind::Numeric => col
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect(),
            FeatureKind::Timestamp => text_values(col)?
                .into_iter()
                .map(|v| v.as_deref().and_then(timestamp_seconds).unwrap_or(f64::NAN))
                .collect(),
            FeatureKind::Categorical { levels } => text_values(col)?
                .into_iter()
                .map(|v| {
                    v.and_then(|s| levels.get(&s).copied())
                        .map_or(f64::NAN, f64::from)
                })
                .collect(),
        };
        Ok(values)
    }

    /// Row-major feature matrix in schema column order
    pub fn to_matrix(&self, df: &DataFrame, shape_check: ShapeCheck) -> Result<Array2<f64>> {
        if shape_check == ShapeCheck::Strict {
            self.check_shape(df)?;
        }
        let n_rows = df.height();
        let col_data: Vec<Vec<f64>> = self
            .columns
            .iter()
            .map(|feature| match df.column(&feature.name) {
                Ok(col) => self.column_values(feature, col),
                Err(_) => Ok(vec![f64::NAN; n_rows]),
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, self.columns.len()), |(r, c)| col_refs[c][r]))
    }
}
