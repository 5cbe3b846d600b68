//! The benchmark run: load, train, predict, report

use crate::config::BenchmarkConfig;
use crate::datasets::columns::EVENT_LABEL;
use crate::datasets::{DatasetKey, FraudDatasetBenchmark};
use crate::error::Result;
use crate::evaluation::{value_counts, EvaluationReport, ValueCounts};
use crate::inference::predict;
use crate::training::Trainer;
use ndarray::Array1;
use std::io::Write;
use std::time::Instant;
use tracing::info;

/// What a run produced besides its printed report
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub key: DatasetKey,
    /// One score per test row, in test row order
    pub predictions: Array1<f64>,
    pub test_rows: usize,
    pub rounds: usize,
    pub test_label_counts: ValueCounts,
    pub train_label_balance: ValueCounts,
    pub report: EvaluationReport,
}

/// Run every stage once, in order, writing the human-readable report to `out`.
/// The first failing stage ends the run.
pub fn run<W: Write>(config: &BenchmarkConfig, out: &mut W) -> Result<RunOutcome> {
    let start = Instant::now();
    let n = config.preview_rows;

    let dataset = FraudDatasetBenchmark::load(&config.loader)?;
    writeln!(out, "########## Object key: ##########")?;
    writeln!(out, "{}", dataset.key)?;

    writeln!(out, "########## Train set: ##########")?;
    writeln!(out, "{}", dataset.train.head(Some(n)))?;
    writeln!(out, "{}", dataset.train.width())?;
    writeln!(out, "{:?}", dataset.train.shape())?;

    let model = Trainer::train(&dataset.train, EVENT_LABEL, &config.params, config.num_round)?;

    writeln!(out, "Test set: ")?;
    writeln!(out, "{}", dataset.test.head(Some(n)))?;
    writeln!(out, "{:?}", dataset.test.shape())?;

    let predictions = predict(&model, &dataset.test, &config.predict)?;

    writeln!(out, "Test scores")?;
    writeln!(out, "{}", dataset.test_labels.head(Some(n)))?;
    let test_label_counts = value_counts(&dataset.test_labels, EVENT_LABEL, false)?;
    writeln!(out, "{}", test_label_counts)?;
    let train_label_balance = value_counts(&dataset.train, EVENT_LABEL, true)?;
    writeln!(out, "{}", train_label_balance)?;
    writeln!(out, "=========")?;

    let report = dataset.eval(&predictions)?;
    writeln!(out, "{}", report)?;
    out.flush()?;

    info!(
        key = %dataset.key,
        roc_auc = ?report.roc_auc,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Benchmark run complete"
    );

    Ok(RunOutcome {
        key: dataset.key,
        test_rows: dataset.test.height(),
        rounds: model.rounds(),
        predictions,
        test_label_counts,
        train_label_balance,
        report,
    })
}
