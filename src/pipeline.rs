//! End-to-end run: assemble → train → predict each entry → package.

use std::path::PathBuf;

use crate::archive::TarEntrySource;
use crate::batch::run_batch;
use crate::classifier::Classifier;
use crate::config::RunConfig;
use crate::error::{PipelineError, Result};
use crate::package::{package, remove_existing};
use crate::staging::ScratchDir;
use crate::training::assemble;

/// The four files a run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub train_matrix: PathBuf,
    pub train_labels: PathBuf,
    pub test_archive: PathBuf,
    pub output: PathBuf,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub training_cells: usize,
    pub entries: usize,
    pub predicted_cells: usize,
}

/// Run the whole pipeline.
///
/// Any previous archive at the output path is removed once the model is
/// trained; the new one is only written after every entry has been
/// predicted. A run that fails past training therefore leaves no archive at
/// all. The scratch directory is removed on every exit path.
pub fn run<C: Classifier + ?Sized>(
    paths: &RunPaths,
    config: &RunConfig,
    classifier: &C,
) -> Result<RunSummary> {
    log::info!("Loading training data...");
    let (training, schema) = assemble(&paths.train_matrix, &paths.train_labels, config.delimiter)?;

    log::info!("Training model...");
    let model = classifier.train(&training).map_err(PipelineError::Classifier)?;
    let training_cells = training.len();
    drop(training);
    remove_existing(&paths.output)?;

    log::info!("Processing test matrices from {}", paths.test_archive.display());
    let mut scratch = ScratchDir::new()?;
    let mut source = TarEntrySource::new(&paths.test_archive);
    let staged = run_batch(&mut source, &schema, &model, &mut scratch, config)?;

    log::info!("Packing results to {}...", paths.output.display());
    package(&scratch, &staged, &paths.output, config.compression())?;
    drop(scratch);

    Ok(RunSummary {
        training_cells,
        entries: staged.len(),
        predicted_cells: staged.iter().map(|s| s.rows).sum(),
    })
}
