use clap::ValueEnum;

use super::model::{Matrix, MarkerSchema};
use crate::error::{PipelineError, Result};

/// What to do with a test entry whose width differs from the training schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WidthPolicy {
    /// Name the entry's own columns `M0..M(n-1)` and carry on.
    #[default]
    Relabel,
    /// Pad missing trailing markers with NaN or drop extra trailing columns.
    Conform,
    /// Fail the run.
    Reject,
}

/// Give `matrix` marker names according to `policy`.
///
/// Width mismatches are logged as warnings unless the policy rejects them.
pub fn align_entry(
    entry: &str,
    matrix: Matrix,
    schema: &MarkerSchema,
    policy: WidthPolicy,
) -> Result<Matrix> {
    let expected = schema.len();
    let actual = matrix.n_cols();

    if actual == expected {
        return Ok(matrix.with_column_names(schema.names().to_vec()));
    }

    match policy {
        WidthPolicy::Relabel => {
            log::warn!(
                "Column count mismatch in {entry}: expected {expected}, found {actual}; \
                 columns relabeled M0..M{}",
                actual.saturating_sub(1)
            );
            let names = MarkerSchema::from_width(actual).names().to_vec();
            Ok(matrix.with_column_names(names))
        }
        WidthPolicy::Conform => {
            log::warn!(
                "Column count mismatch in {entry}: expected {expected}, found {actual}; \
                 {} to the training schema",
                if actual < expected { "padded" } else { "truncated" }
            );
            Ok(matrix.conform(schema.names().to_vec(), f64::NAN))
        }
        WidthPolicy::Reject => Err(PipelineError::WidthMismatch {
            entry: entry.to_string(),
            expected,
            actual,
        }),
    }
}
