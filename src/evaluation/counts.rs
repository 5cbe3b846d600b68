//! Per-value counts of a column

use crate::error::{FraudBenchError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// Counts (or proportions) of each distinct non-null value, most frequent first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCounts {
    pub column: String,
    pub normalized: bool,
    pub entries: Vec<(String, f64)>,
}

impl ValueCounts {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn get(&self, value: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == value).map(|(_, v)| *v)
    }
}

/// Value counts of `column`; with `normalize` the counts become shares of the non-null rows
pub fn value_counts(df: &DataFrame, column: &str, normalize: bool) -> Result<ValueCounts> {
    let col = df
        .column(column)
        .map_err(|_| FraudBenchError::FeatureNotFound(column.to_string()))?;
    let values = col.cast(&DataType::String)?.as_materialized_series().drop_nulls();

    let name = if column == "count" { "n" } else { "count" };
    let counts = values.value_counts(false, false, name.into(), normalize)?;
    let keys = counts.select_at_idx(0).map(|c| c.as_materialized_series().clone());
    let tallies = counts.column(name)?.cast(&DataType::Float64)?;
    let keys = keys.ok_or_else(|| FraudBenchError::DataError(format!("no values column for {column}")))?;

    let mut entries: Vec<(String, f64)> = keys
        .str()?
        .into_iter()
        .zip(tallies.as_materialized_series().f64()?.into_iter())
        .filter_map(|(k, v)| Some((k?.to_string(), v?)))
        .collect();
    // most frequent first, ties by value
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ValueCounts { column: column.to_string(), normalized: normalize, entries })
}

impl fmt::Display for ValueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.column)?;
        let key_width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (k, v) in &self.entries {
            if self.normalized {
                writeln!(f, "{:<kw$}    {:.6}", k, v, kw = key_width)?;
            } else {
                writeln!(f, "{:<kw$}    {}", k, *v as u64, kw = key_width)?;
            }
        }
        write!(f, "Name: {}, dtype: {}", if self.normalized { "proportion" } else { "count" },
            if self.normalized { "float64" } else { "int64" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> DataFrame {
        df!("EVENT_LABEL" => &[Some(0i64), Some(1), Some(0), Some(0), None]).unwrap()
    }

    #[test]
    fn test_counts_most_frequent_first() {
        let vc = value_counts(&labels(), "EVENT_LABEL", false).unwrap();
        assert_eq!(vc.entries, vec![("0".to_string(), 3.0), ("1".to_string(), 1.0)]);
        assert_eq!(vc.total(), 4.0);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let vc = value_counts(&labels(), "EVENT_LABEL", true).unwrap();
        assert!((vc.total() - 1.0).abs() < 1e-12);
        assert_eq!(vc.get("1"), Some(0.25));
    }

    #[test]
    fn test_display() {
        let vc = value_counts(&labels(), "EVENT_LABEL", false).unwrap();
        let text = vc.to_string();
        assert!(text.starts_with("EVENT_LABEL\n0    3\n1    1\n"));
        assert!(text.ends_with("Name: count, dtype: int64"));
    }

    #[test]
    fn test_missing_column() {
        assert!(matches!(
            value_counts(&labels(), "LABEL", true),
            Err(FraudBenchError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_ties_and_nulls() {
        let df = df!("ENTITY_TYPE" => &[Some("b"), Some("a"), None, Some("b"), Some("a"), None]).unwrap();
        let vc = value_counts(&df, "ENTITY_TYPE", true).unwrap();
        assert_eq!(vc.entries, vec![("a".to_string(), 0.5), ("b".to_string(), 0.5)]);
    }
}
