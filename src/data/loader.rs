use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use super::model::Table;
use crate::archive::{self, is_archive_name, is_tabular_name};
use crate::error::{PipelineError, Result, StrategyFailure};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Whether the first row of a source holds column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Every row is data.
    #[default]
    Absent,
    FirstRow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub header: HeaderMode,
    /// Overrides inferred column names when set.
    pub column_names: Option<Vec<String>>,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            header: HeaderMode::Absent,
            column_names: None,
            delimiter: b',',
        }
    }
}

impl LoadOptions {
    pub fn headerless(delimiter: u8) -> Self {
        LoadOptions {
            delimiter,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }

    pub fn with_column_names(mut self, names: Vec<String>) -> Self {
        self.column_names = Some(names);
        self
    }
}

// ---------------------------------------------------------------------------
// Decoding strategies
// ---------------------------------------------------------------------------

/// One way of turning a file into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First `.csv` member of a tar archive.
    ArchiveMember,
    /// Whole file as gzip-compressed delimited text.
    Gzip,
    /// Whole file as plain delimited text.
    Plain,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::ArchiveMember => "archive-member",
            Strategy::Gzip => "gzip",
            Strategy::Plain => "plain",
        }
    }
}

/// Strategies tried for `path`, in order. Dispatch is by file name only.
pub fn strategies_for(path: &Path) -> &'static [Strategy] {
    let name = path.to_string_lossy();
    if is_archive_name(&name) {
        &[Strategy::ArchiveMember, Strategy::Gzip]
    } else {
        &[Strategy::Plain, Strategy::Gzip]
    }
}

enum AttemptError {
    /// This strategy does not fit; try the next one.
    Failed(String),
    /// Stop here.
    Terminal(PipelineError),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from a file, trying each strategy from [`strategies_for`].
///
/// Supported encodings:
/// * `.tar` / `.tar.gz` / `.tgz` – the first `.csv` member is parsed
/// * gzip-compressed delimited text
/// * plain delimited text
///
/// An archive without any `.csv` member is an error of its own and is not
/// retried. Any other failure moves on to the next strategy; when all fail
/// the error lists every attempt.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    std::fs::metadata(path)
        .map_err(|e| PipelineError::io(format!("opening {}", path.display()), e))?;

    let mut attempts = Vec::new();
    for &strategy in strategies_for(path) {
        match attempt(strategy, path, options) {
            Ok(table) => {
                if !attempts.is_empty() {
                    log::warn!(
                        "{} parsed as {} after {} failed attempt(s)",
                        path.display(),
                        strategy.name(),
                        attempts.len()
                    );
                }
                log::debug!(
                    "Loaded {} ({} rows × {} columns) via {}",
                    path.display(),
                    table.n_rows(),
                    table.n_cols(),
                    strategy.name()
                );
                return Ok(table);
            }
            Err(AttemptError::Terminal(err)) => return Err(err),
            Err(AttemptError::Failed(reason)) => {
                log::debug!("{}: {} failed: {reason}", path.display(), strategy.name());
                attempts.push(StrategyFailure {
                    strategy: strategy.name(),
                    reason,
                });
            }
        }
    }

    Err(PipelineError::Format {
        path: path.to_path_buf(),
        attempts,
    })
}

/// Errors from parsing delimited text out of a reader.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("no rows to parse")]
    Empty,
    #[error("{names} column name(s) supplied for {width} column(s)")]
    ColumnNames { names: usize, width: usize },
}

/// Parse delimited text from `reader`.
///
/// Cells are kept verbatim and must be valid UTF-8; every row must have the
/// same number of cells. Blank lines are skipped.
pub fn read_table<R: Read>(reader: R, options: &LoadOptions) -> std::result::Result<Table, ReadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let mut rows: Vec<Vec<String>> = Vec::new();

    let header = match options.header {
        HeaderMode::Absent => None,
        HeaderMode::FirstRow => match records.next() {
            Some(record) => Some(record?.iter().map(str::to_string).collect::<Vec<_>>()),
            None => return Err(ReadError::Empty),
        },
    };

    for record in records {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    let width = match (&header, rows.first()) {
        (Some(names), _) => names.len(),
        (None, Some(first)) => first.len(),
        (None, None) => return Err(ReadError::Empty),
    };

    let column_names = match (&options.column_names, header) {
        (Some(names), _) if names.len() != width => {
            return Err(ReadError::ColumnNames {
                names: names.len(),
                width,
            })
        }
        (Some(names), _) => names.clone(),
        (None, Some(names)) => names,
        (None, None) => (0..width).map(|i| i.to_string()).collect(),
    };

    Ok(Table::new(column_names, rows))
}

// ---------------------------------------------------------------------------
// Strategy implementations
// ---------------------------------------------------------------------------

fn attempt(strategy: Strategy, path: &Path, options: &LoadOptions) -> std::result::Result<Table, AttemptError> {
    match strategy {
        Strategy::ArchiveMember => load_archive_member(path, options),
        Strategy::Gzip => {
            let file = open(path)?;
            read_table(MultiGzDecoder::new(BufReader::new(file)), options)
                .map_err(|e| AttemptError::Failed(e.to_string()))
        }
        Strategy::Plain => {
            let file = open(path)?;
            read_table(BufReader::new(file), options).map_err(|e| AttemptError::Failed(e.to_string()))
        }
    }
}

fn open(path: &Path) -> std::result::Result<File, AttemptError> {
    File::open(path).map_err(|e| {
        AttemptError::Terminal(PipelineError::io(format!("opening {}", path.display()), e))
    })
}

fn load_archive_member(path: &Path, options: &LoadOptions) -> std::result::Result<Table, AttemptError> {
    let failed = |e: std::io::Error| AttemptError::Failed(format!("not a readable tar archive: {e}"));

    let mut tar = archive::open_tar(path).map_err(failed)?;
    for entry in tar.entries().map_err(failed)? {
        let entry = entry.map_err(failed)?;
        let name = entry.path().map_err(failed)?.to_string_lossy().into_owned();
        if is_tabular_name(&name) {
            log::debug!("Using member {name} of {}", path.display());
            return read_table(entry, options)
                .map_err(|e| AttemptError::Failed(format!("member {name}: {e}")));
        }
    }

    Err(AttemptError::Terminal(PipelineError::NoTabularMember {
        path: path.to_path_buf(),
    }))
}
