//! Fraud benchmark datasets
//!
//! - [`DatasetKey`] names one of the eight benchmarks
//! - [`SyntheticFillConfig`] controls placeholder values for missing reserved columns
//! - [`FraudDatasetBenchmark::load`] produces a [`FraudDataset`] (train / test / test labels)

pub mod columns;
mod fill;
mod key;
mod loader;
mod source;

pub use fill::{fill_missing, SyntheticFillConfig, SYNTHETIC_ENTITY_TYPE};
pub use key::DatasetKey;
pub use loader::{label_vector, read_csv, write_csv, FraudDataset, FraudDatasetBenchmark, LoaderConfig};
pub use source::{normalize, timestamp_seconds, LabelRule, SourceLayout, TimestampRule};
