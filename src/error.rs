//! Error types for the batch pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One failed attempt at decoding a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    /// Strategy name (`archive-member`, `gzip`, `plain`).
    pub strategy: &'static str,
    pub reason: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Coarse error taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Schema,
    Input,
    Classifier,
    Io,
}

/// Errors that can occur while running the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No decoding strategy could parse the table
    #[error("could not parse '{}' as a table ({})", path.display(), render_attempts(attempts))]
    Format {
        path: PathBuf,
        attempts: Vec<StrategyFailure>,
    },

    /// Archive opened fine but holds nothing tabular
    #[error("no tabular member found in '{}'", path.display())]
    NoTabularMember { path: PathBuf },

    /// A matrix cell is neither numeric nor a missing-value marker
    #[error("non-numeric value '{value}' in {source_name} at row {row}, column {column}")]
    NonNumeric {
        source_name: String,
        row: usize,
        column: usize,
        value: String,
    },

    /// Training matrix and labels disagree on row count
    #[error("row-count mismatch: {matrix_rows} training cells vs {label_rows} labels")]
    Schema {
        matrix_rows: usize,
        label_rows: usize,
    },

    /// Test archive holds no tabular entries
    #[error("empty archive: no .csv entries found in '{}'", path.display())]
    EmptyArchive { path: PathBuf },

    /// Entry width differs from the training schema under the reject policy
    #[error("entry '{entry}' has {actual} columns, training schema has {expected}")]
    WidthMismatch {
        entry: String,
        expected: usize,
        actual: usize,
    },

    /// Failure raised by the classifier, surfaced unmodified
    #[error(transparent)]
    Classifier(anyhow::Error),

    /// I/O error
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Format { .. }
            | PipelineError::NoTabularMember { .. }
            | PipelineError::NonNumeric { .. } => ErrorKind::Format,
            PipelineError::Schema { .. } => ErrorKind::Schema,
            PipelineError::EmptyArchive { .. } | PipelineError::WidthMismatch { .. } => {
                ErrorKind::Input
            }
            PipelineError::Classifier(_) => ErrorKind::Classifier,
            PipelineError::Io { .. } => ErrorKind::Io,
        }
    }
}

fn render_attempts(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
