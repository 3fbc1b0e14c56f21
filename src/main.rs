//! mlforge: SVM classification and K-Means clustering from the command line
//!
//! Parses arguments, sets up logging, runs the selected pipeline and prints
//! its report as text or JSON.

use std::fmt::Display;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use mlforge::cli::Command;
use mlforge::config::SweepConfig;
use mlforge::{pipeline, Args};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let start_time = Instant::now();
    let options = args.run_options();
    let seed = args.seed;

    match &args.command {
        Command::Explore(cmd) => emit(&args, &pipeline::run_exploration(&cmd.input, &options)?)?,
        Command::Svm(cmd) => {
            let config = cmd.to_config(seed)?;
            emit(&args, &pipeline::run_svm(&cmd.input, &config, &options)?)?
        }
        Command::Kmeans(cmd) => {
            let config = cmd.to_config(seed)?;
            emit(&args, &pipeline::run_kmeans(&cmd.input, &config, &options)?)?
        }
        Command::Elbow(cmd) => {
            let config = cmd.to_config(SweepConfig::elbow(), seed);
            emit(&args, &pipeline::run_elbow(&cmd.input, &config, &options)?)?
        }
        Command::Silhouette(cmd) => {
            let config = cmd.to_config(SweepConfig::silhouette(), seed);
            emit(&args, &pipeline::run_silhouette(&cmd.input, &config, &options)?)?
        }
        Command::Advanced(cmd) => {
            let config = cmd.to_config(seed);
            emit(&args, &pipeline::run_advanced(&cmd.input, &config, &options)?)?
        }
    }

    info!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "mlforge=debug" } else { "mlforge=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn emit<R: Serialize + Display>(args: &Args, report: &R) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
