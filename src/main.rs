use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use cytoclass::cli::{Cli, USAGE};
use cytoclass::NearestCentroid;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                println!("{USAGE}");
                return ExitCode::FAILURE;
            }
            _ => err.exit(),
        },
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let paths = cli.paths();
    let summary = cytoclass::run(&paths, &cli.tuning.config(), &NearestCentroid)
        .with_context(|| format!("cytoclass run for {} failed", paths.test_archive.display()))?;
    log::info!(
        "Done: {} entries, {} cells predicted, written to {}",
        summary.entries,
        summary.predicted_cells,
        paths.output.display()
    );
    Ok(())
}
