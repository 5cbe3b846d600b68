//! fraud-bench - Main Entry Point
//!
//! Loads a fraud benchmark dataset, trains a gradient-boosted classifier,
//! scores the test split and prints the evaluation.

use clap::Parser;
use fraud_bench::cli::{cmd_list, cmd_run, Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraud_bench=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => cmd_run(&args)?,
        Some(Commands::List { data_dir }) => cmd_list(&data_dir)?,
        // Default: the benchmark script's fixed run
        None => cmd_run(&RunArgs::default())?,
    }

    Ok(())
}
