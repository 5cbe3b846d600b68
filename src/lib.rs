//! fraud-bench - fraud detection benchmark runner
//!
//! Loads one of eight fraud datasets, trains a LightGBM-style gradient-boosted
//! classifier on the training split, scores the test split and reports
//! ranking metrics.
//!
//! # Modules
//!
//! - [`datasets`] - Dataset keys, synthetic fill, loading and splitting
//! - [`training`] - Booster parameters, feature schema, leaf-wise GBDT
//! - [`inference`] - Scoring with tolerant or strict column checks
//! - [`evaluation`] - Value counts, ROC-AUC, average precision, recall at FPR
//! - [`pipeline`] - The sequential benchmark run
//! - [`cli`] - Command-line interface

pub mod error;
pub mod config;

pub mod datasets;
pub mod training;
pub mod inference;
pub mod evaluation;
pub mod pipeline;

pub mod cli;

pub use config::BenchmarkConfig;
pub use error::{FraudBenchError, Result};
