//! Benchmark dataset loader
//!
//! Reads a dataset's downloaded source from `<data_dir>/<key>/raw/`, normalizes
//! it into the reserved schema, fills synthetic values, splits it into
//! train / test / test labels and caches the split under
//! `<data_dir>/<key>/processed/`. With `load_pre_downloaded` the cached split is
//! read back directly.

use super::columns::{EVENT_ID, EVENT_LABEL, RESERVED_COLUMNS, RESERVED_TEXT_COLUMNS, TEST_WITHHELD};
use super::fill::{fill_missing, SyntheticFillConfig};
use super::source::normalize;
use super::DatasetKey;
use crate::error::{FraudBenchError, Result};
use crate::evaluation::{evaluate, EvaluationReport};
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const TRAIN_FILE: &str = "train.csv";
const TEST_FILE: &str = "test.csv";
const TEST_LABELS_FILE: &str = "test_labels.csv";

/// Loader options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub key: DatasetKey,
    /// Read the cached processed split instead of the raw source
    pub load_pre_downloaded: bool,
    /// Remove the raw source directory once loaded
    pub delete_downloaded: bool,
    pub add_random_values_if_real_na: SyntheticFillConfig,
    pub data_dir: PathBuf,
    /// Share of rows kept for training
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            key: DatasetKey::VehicleLoan,
            load_pre_downloaded: false,
            delete_downloaded: false,
            add_random_values_if_real_na: SyntheticFillConfig::default(),
            data_dir: PathBuf::from("data"),
            train_fraction: 0.8,
            seed: 1,
        }
    }
}

impl LoaderConfig {
    pub fn new(key: DatasetKey) -> Self {
        Self { key, ..Default::default() }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_load_pre_downloaded(mut self, enabled: bool) -> Self {
        self.load_pre_downloaded = enabled;
        self
    }

    pub fn with_delete_downloaded(mut self, enabled: bool) -> Self {
        self.delete_downloaded = enabled;
        self
    }

    pub fn with_fill(mut self, fill: SyntheticFillConfig) -> Self {
        self.add_random_values_if_real_na = fill;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join(self.key.as_str())
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.dataset_dir().join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.dataset_dir().join("processed")
    }

    fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(FraudBenchError::ConfigError(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }
}

/// A loaded benchmark: training rows, test rows without labels, and the held-out labels
#[derive(Debug, Clone)]
pub struct FraudDataset {
    pub key: DatasetKey,
    pub train: DataFrame,
    pub test: DataFrame,
    pub test_labels: DataFrame,
}

impl FraudDataset {
    /// Score predictions against the held-out labels; predictions align with `test` by position
    pub fn eval(&self, predictions: &Array1<f64>) -> Result<EvaluationReport> {
        let n_labels = self.test_labels.height();
        if predictions.len() != n_labels {
            return Err(FraudBenchError::ShapeError {
                expected: format!("{} predictions", n_labels),
                actual: format!("{} predictions", predictions.len()),
            });
        }
        let labels = label_vector(&self.test_labels)?;
        evaluate(&labels, predictions)
    }
}

/// `EVENT_LABEL` as 0.0 / 1.0
pub fn label_vector(df: &DataFrame) -> Result<Array1<f64>> {
    let col = df
        .column(EVENT_LABEL)
        .map_err(|_| FraudBenchError::FeatureNotFound(EVENT_LABEL.to_string()))?;
    let values = col
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| FraudBenchError::DataError(format!("{} contains nulls", EVENT_LABEL)))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from_vec(values))
}

/// Entry point mirroring the benchmark's loader object
pub struct FraudDatasetBenchmark;

impl FraudDatasetBenchmark {
    pub fn load(config: &LoaderConfig) -> Result<FraudDataset> {
        config.validate()?;
        let start = Instant::now();

        let dataset = if config.load_pre_downloaded {
            load_processed(config)?
        } else {
            let dataset = load_raw(config)?;
            save_processed(&dataset, &config.processed_dir())?;
            dataset
        };

        if config.delete_downloaded {
            let raw = config.raw_dir();
            if raw.exists() {
                std::fs::remove_dir_all(&raw)?;
                info!(path = %raw.display(), "Deleted downloaded source");
            } else {
                warn!(path = %raw.display(), "Nothing to delete");
            }
        }

        info!(
            key = %config.key,
            train_rows = dataset.train.height(),
            test_rows = dataset.test.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        Ok(dataset)
    }
}

fn require(key: DatasetKey, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(FraudBenchError::DatasetUnavailable {
            key: key.to_string(),
            path: path.display().to_string(),
        })
    }
}

/// Read a CSV, inferring column types from every row
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    read_csv_with(path, None)
}

fn read_csv_with(path: &Path, schema_overwrite: Option<SchemaRef>) -> Result<DataFrame> {
    let file = File::open(path)?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(schema_overwrite)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| FraudBenchError::DataError(format!("{}: {}", path.display(), e)))
}

/// Read one processed file back with the reserved text columns typed as text,
/// so a cached split has the same dtypes as the split it was written from
fn read_processed(path: &Path) -> Result<DataFrame> {
    let header = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(0))
        .into_reader_with_file_handle(File::open(path)?)
        .finish()
        .map_err(|e| FraudBenchError::DataError(format!("{}: {}", path.display(), e)))?;
    let text: Schema = header
        .get_column_names()
        .into_iter()
        .filter(|name| RESERVED_TEXT_COLUMNS.contains(&name.as_str()))
        .map(|name| Field::new(name.clone(), DataType::String))
        .collect();
    read_csv_with(path, Some(Arc::new(text)))
}

pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

fn load_processed(config: &LoaderConfig) -> Result<FraudDataset> {
    let dir = config.processed_dir();
    let read = |name: &str| -> Result<DataFrame> {
        let path = dir.join(name);
        require(config.key, &path)?;
        read_processed(&path)
    };
    Ok(FraudDataset {
        key: config.key,
        train: read(TRAIN_FILE)?,
        test: read(TEST_FILE)?,
        test_labels: read(TEST_LABELS_FILE)?,
    })
}

fn load_raw(config: &LoaderConfig) -> Result<FraudDataset> {
    let layout = config.key.layout();
    let path = config.raw_dir().join(layout.file);
    require(config.key, &path)?;

    let raw = read_csv(&path)?;
    let mut df = normalize(raw, &layout)?;
    if df.height() < 2 {
        return Err(FraudBenchError::DataError(format!(
            "{} has {} labelled rows, need at least 2",
            path.display(),
            df.height()
        )));
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    fill_missing(&mut df, &config.add_random_values_if_real_na, &mut rng)?;
    let df = reserved_first(&df)?;

    let (train, rest) = split(&df, config.train_fraction, &mut rng)?;
    let mut test = rest.clone();
    for name in TEST_WITHHELD {
        if test.column(name).is_ok() {
            test = test.drop(name)?;
        }
    }
    let label_cols: Vec<&str> = [EVENT_ID, EVENT_LABEL]
        .into_iter()
        .filter(|c| rest.column(c).is_ok())
        .collect();
    let test_labels = rest.select(label_cols)?;

    Ok(FraudDataset { key: config.key, train, test, test_labels })
}

fn reserved_first(df: &DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let mut ordered: Vec<String> = RESERVED_COLUMNS
        .iter()
        .filter(|c| names.iter().any(|n| n == *c))
        .map(|c| c.to_string())
        .collect();
    ordered.extend(names.into_iter().filter(|n| !RESERVED_COLUMNS.contains(&n.as_str())));
    Ok(df.select(ordered)?)
}

/// Seeded shuffle split; both halves keep at least one row
fn split(df: &DataFrame, train_fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Result<(DataFrame, DataFrame)> {
    let n = df.height();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let n_train = ((n as f64 * train_fraction).ceil() as usize).clamp(1, n - 1);

    let take = |idx: &[usize]| -> Result<DataFrame> {
        let idx: Vec<IdxSize> = idx.iter().map(|&i| i as IdxSize).collect();
        Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
    };
    Ok((take(&indices[..n_train])?, take(&indices[n_train..])?))
}

fn save_processed(dataset: &FraudDataset, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_csv(&dataset.train, &dir.join(TRAIN_FILE))?;
    write_csv(&dataset.test, &dir.join(TEST_FILE))?;
    write_csv(&dataset.test_labels, &dir.join(TEST_LABELS_FILE))?;
    Ok(())
}
