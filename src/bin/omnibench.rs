//! Benchmark-orchestrator adapter: named parameters → one pipeline run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cytoclass::cli::TuningArgs;
use cytoclass::{NearestCentroid, RunPaths};

/// Run cytoclass with the orchestrator's named inputs and output directory.
#[derive(Parser, Debug)]
#[command(name = "omnibench", version, about)]
struct Args {
    /// Directory where outputs must be written
    #[arg(long = "output_dir")]
    output_dir: PathBuf,

    /// Dataset name used in the output file name
    #[arg(long)]
    name: String,

    #[arg(long = "data.train_matrix")]
    train_matrix: PathBuf,

    #[arg(long = "data.train_labels")]
    train_labels: PathBuf,

    #[arg(long = "data.test_matrix")]
    test_matrix: PathBuf,

    #[command(flatten)]
    tuning: TuningArgs,
}

impl Args {
    fn output_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_predicted_labels.tar.gz", self.name))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(output) => {
            log::info!("Predictions saved to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let paths = RunPaths {
        train_matrix: args.train_matrix.clone(),
        train_labels: args.train_labels.clone(),
        test_archive: args.test_matrix.clone(),
        output: args.output_file(),
    };
    log::info!("Running cytoclass for dataset {}", args.name);
    cytoclass::run(&paths, &args.tuning.config(), &NearestCentroid)?;
    Ok(paths.output)
}
