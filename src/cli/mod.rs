//! fraud-bench CLI
//!
//! `run` executes one benchmark; `list` shows the datasets and what is on disk.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::BenchmarkConfig;
use crate::datasets::{DatasetKey, LoaderConfig};
use crate::pipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fraud-bench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate a gradient-boosted fraud classifier on a benchmark dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a dataset, train, predict and print the evaluation
    Run(RunArgs),

    /// List the benchmark datasets and their local state
    List {
        /// Root directory holding `<key>/raw` and `<key>/processed`
        #[arg(long, env = "FRAUD_BENCH_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// JSON run configuration; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset key (fakejob, vehicleloan, malurl, ieeecis, ccfraud, fraudecom, twitterbot, ipblock)
    #[arg(short, long, value_parser = parse_key)]
    pub key: Option<DatasetKey>,

    /// Root directory holding `<key>/raw` and `<key>/processed`
    #[arg(long, env = "FRAUD_BENCH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Read the cached processed split instead of the raw source
    #[arg(long)]
    pub load_pre_downloaded: bool,

    /// Remove the raw source files once loaded
    #[arg(long)]
    pub delete_downloaded: bool,

    /// Boosting rounds passed alongside the parameter map
    #[arg(long)]
    pub num_round: Option<usize>,

    /// Leave this reserved column null instead of synthesizing values (repeatable)
    #[arg(long = "no-fill", value_name = "COLUMN")]
    pub no_fill: Vec<String>,

    /// Seed for synthetic values and the train/test split
    #[arg(long)]
    pub seed: Option<u64>,
}

fn parse_key(s: &str) -> Result<DatasetKey, String> {
    s.parse().map_err(|e: crate::error::FraudBenchError| e.to_string())
}

impl RunArgs {
    /// Start from the config file (or defaults) and apply the flags on top
    pub fn resolve(&self) -> anyhow::Result<BenchmarkConfig> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::load(path)?,
            None => BenchmarkConfig::default(),
        };
        let loader: &mut LoaderConfig = &mut config.loader;
        if let Some(key) = self.key {
            loader.key = key;
        }
        if let Some(dir) = &self.data_dir {
            loader.data_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            loader.seed = seed;
        }
        loader.load_pre_downloaded |= self.load_pre_downloaded;
        loader.delete_downloaded |= self.delete_downloaded;
        for column in &self.no_fill {
            loader.add_random_values_if_real_na.set(column, false)?;
        }
        if let Some(n) = self.num_round {
            config.num_round = n;
        }
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(args: &RunArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let start = Instant::now();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = pipeline::run(&config, &mut out)?;

    section("Done");
    step_ok(&format!(
        "{} · {} test rows scored · {} rounds · {:.2?}",
        outcome.key, outcome.test_rows, outcome.rounds, start.elapsed()
    ));
    println!();
    Ok(())
}

pub fn cmd_list(data_dir: &Path) -> anyhow::Result<()> {
    section("Datasets");
    println!(
        "  {:<12} {:<34} {:<32} {}",
        muted("Key"), muted("Description"), muted("Source file"), muted("Local")
    );
    println!("  {}", dim(&"─".repeat(90)));

    for key in DatasetKey::ALL {
        let loader = LoaderConfig::new(key).with_data_dir(data_dir);
        let layout = key.layout();
        let mut state = Vec::new();
        if loader.raw_dir().join(layout.file).exists() {
            state.push("raw");
        }
        if loader.processed_dir().join("train.csv").exists() {
            state.push("processed");
        }
        let state = if state.is_empty() { dim("—") } else { ok(&state.join(", ")) };
        println!(
            "  {:<12} {:<34} {:<32} {}",
            key.as_str().white(), key.description(), layout.file, state
        );
    }
    println!();
    Ok(())
}
