//! Training set assembly: matrix + labels → labeled table.

use std::path::Path;

use crate::data::loader::{load_table, LoadOptions};
use crate::data::model::{is_missing, LabeledTable, MarkerSchema, Table};
use crate::error::{PipelineError, Result};

/// Load the training matrix and labels and join them.
///
/// Both sources are headerless. Fails with a schema error when their row
/// counts differ.
pub fn assemble(
    matrix_path: &Path,
    labels_path: &Path,
    delimiter: u8,
) -> Result<(LabeledTable, MarkerSchema)> {
    let options = LoadOptions::headerless(delimiter);
    let matrix = load_table(matrix_path, &options)?;
    let labels = load_table(labels_path, &options)?;
    join_labels(&matrix, &labels, &matrix_path.display().to_string())
}

/// Join an already loaded matrix and label table.
///
/// The label column is the last column of `labels`; rows whose label is a
/// missing-value marker are dropped after the row-count check.
pub fn join_labels(
    matrix: &Table,
    labels: &Table,
    matrix_name: &str,
) -> Result<(LabeledTable, MarkerSchema)> {
    if matrix.n_rows() != labels.n_rows() {
        return Err(PipelineError::Schema {
            matrix_rows: matrix.n_rows(),
            label_rows: labels.n_rows(),
        });
    }
    if labels.n_cols() > 1 {
        log::warn!(
            "Label source has {} columns; using the last one",
            labels.n_cols()
        );
    }
    let label_col = labels.n_cols() - 1;

    let schema = MarkerSchema::from_width(matrix.n_cols());
    let mut markers = matrix
        .to_matrix(matrix_name)?
        .with_column_names(schema.names().to_vec());

    let raw: Vec<&str> = labels.column(label_col).collect();
    markers.retain_rows(|i| !is_missing(raw[i]));
    let kept: Vec<String> = raw
        .into_iter()
        .filter(|l| !is_missing(l))
        .map(str::to_string)
        .collect();

    let dropped = matrix.n_rows() - kept.len();
    if dropped > 0 {
        log::info!("Dropped {dropped} training cell(s) without a label");
    }
    log::info!(
        "Training set: {} cells, {} markers ({schema})",
        kept.len(),
        schema.len()
    );

    let table = LabeledTable {
        schema: schema.clone(),
        markers,
        labels: kept,
    };
    Ok((table, schema))
}
