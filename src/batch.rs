//! Batch prediction over the entries of a test archive.

use std::collections::HashSet;
use std::io::{Read, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::archive::{EntrySource, TABULAR_SUFFIX};
use crate::classifier::Model;
use crate::config::{EntryOrder, RunConfig};
use crate::data::align::align_entry;
use crate::data::loader::{read_table, Strategy};
use crate::data::model::MarkerSchema;
use crate::error::{PipelineError, Result, StrategyFailure};
use crate::staging::{StagedFile, Staging};

/// Suffix of every staged prediction file.
pub const PREDICTION_SUFFIX: &str = ".predictions.csv.gz";

/// `dir/sample_1.csv` → `sample_1.predictions.csv.gz`; names without the
/// tabular suffix keep their full base name.
pub fn staged_file_name(entry_name: &str) -> String {
    let base = entry_name.rsplit('/').next().unwrap_or(entry_name);
    let stem = base.strip_suffix(TABULAR_SUFFIX).unwrap_or(base);
    format!("{stem}{PREDICTION_SUFFIX}")
}

/// Gzip-compressed, headerless, single-column CSV with one label per line.
pub fn encode_predictions(labels: &[String], compression: Compression) -> std::io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(GzEncoder::new(Vec::new(), compression));
    for label in labels {
        writer.write_record([label])?;
    }
    let mut encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.flush()?;
    encoder.finish()
}

/// Predict every tabular entry of `source` and stage one file per entry.
///
/// Entries are processed one at a time. Any error, including one raised by
/// the model, aborts the batch; width mismatches only abort under
/// [`WidthPolicy::Reject`](crate::data::align::WidthPolicy::Reject).
pub fn run_batch<S, M, St>(
    source: &mut S,
    schema: &MarkerSchema,
    model: &M,
    staging: &mut St,
    config: &RunConfig,
) -> Result<Vec<StagedFile>>
where
    S: EntrySource + ?Sized,
    M: Model + ?Sized,
    St: Staging + ?Sized,
{
    let origin = source.origin();
    let mut driver = Driver {
        schema,
        model,
        staging,
        config,
        origin: &origin,
        staged: Vec::new(),
        names: HashSet::new(),
    };

    let found = match config.entry_order {
        EntryOrder::Archive => source.visit_entries(&mut |name, reader| driver.process(name, reader))?,
        EntryOrder::ByName => {
            let mut buffered: Vec<(String, Vec<u8>)> = Vec::new();
            source.visit_entries(&mut |name, reader| {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| PipelineError::io(format!("reading entry {name}"), e))?;
                buffered.push((name.to_string(), bytes));
                Ok(())
            })?;
            buffered.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, bytes) in &buffered {
                driver.process(name, &mut bytes.as_slice())?;
            }
            buffered.len()
        }
    };

    let staged = driver.staged;
    if found == 0 {
        return Err(PipelineError::EmptyArchive { path: origin });
    }

    log::info!(
        "Predicted {} entries ({} cells) from {}",
        staged.len(),
        staged.iter().map(|s| s.rows).sum::<usize>(),
        origin.display()
    );
    Ok(staged)
}

struct Driver<'a, M: ?Sized, St: ?Sized> {
    schema: &'a MarkerSchema,
    model: &'a M,
    staging: &'a mut St,
    config: &'a RunConfig,
    origin: &'a std::path::Path,
    staged: Vec<StagedFile>,
    names: HashSet<String>,
}

impl<M, St> Driver<'_, M, St>
where
    M: Model + ?Sized,
    St: Staging + ?Sized,
{
    fn process(&mut self, name: &str, reader: &mut dyn Read) -> Result<()> {
        log::info!("Predicting: {name}");

        let table = read_table(reader, &self.config.load_options()).map_err(|e| PipelineError::Format {
            path: self.origin.join(name),
            attempts: vec![StrategyFailure {
                strategy: Strategy::Plain.name(),
                reason: e.to_string(),
            }],
        })?;
        let matrix = table.to_matrix(name)?;
        let rows = matrix.n_rows();
        let matrix = align_entry(name, matrix, self.schema, self.config.width_policy)?;

        let prediction = self.model.predict(&matrix).map_err(PipelineError::Classifier)?;
        if prediction.labels.len() != rows {
            return Err(PipelineError::Classifier(anyhow::anyhow!(
                "classifier returned {} labels for {rows} rows of {name}",
                prediction.labels.len()
            )));
        }
        let labels: Vec<String> = prediction.labels.iter().map(|l| l.to_string()).collect();

        let file_name = staged_file_name(name);
        if !self.names.insert(file_name.clone()) {
            log::warn!("{name} maps to already staged {file_name}; earlier predictions are overwritten");
        }

        let bytes = encode_predictions(&labels, self.config.compression())
            .map_err(|e| PipelineError::io(format!("encoding predictions for {name}"), e))?;
        let staged = self.staging.stage(&file_name, rows, &bytes)?;
        self.staged.push(staged);
        Ok(())
    }
}
