use std::fmt;

use crate::error::{PipelineError, Result};

/// Name forced onto the training label column.
pub const LABEL_COLUMN: &str = "cell_type";

/// Cell contents treated as a missing value (common dataframe defaults).
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#N/A N/A", "#NA", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

// ---------------------------------------------------------------------------
// Table – raw delimited text, one String per cell
// ---------------------------------------------------------------------------

/// A rectangular table of raw cells as parsed from delimited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// One name per column.
    pub column_names: Vec<String>,
    /// Rows in source order; every row has `column_names.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == column_names.len()));
        Table { column_names, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.column_names.len()
    }

    /// Iterate over the cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    /// Parse every cell as a number, ignoring surrounding whitespace.
    /// Missing-value markers become NaN.
    ///
    /// `source_name` only feeds the error message.
    pub fn to_matrix(&self, source_name: &str) -> Result<Matrix> {
        let mut values = Vec::with_capacity(self.n_rows() * self.n_cols());
        for (row_no, row) in self.rows.iter().enumerate() {
            for (col_no, cell) in row.iter().enumerate() {
                let cell = cell.trim();
                let value = if is_missing(cell) {
                    f64::NAN
                } else {
                    cell.parse::<f64>().map_err(|_| PipelineError::NonNumeric {
                        source_name: source_name.to_string(),
                        row: row_no,
                        column: col_no,
                        value: cell.to_string(),
                    })?
                };
                values.push(value);
            }
        }
        Ok(Matrix {
            column_names: self.column_names.clone(),
            n_rows: self.n_rows(),
            values,
        })
    }
}

// ---------------------------------------------------------------------------
// Matrix – numeric marker expression, row-major
// ---------------------------------------------------------------------------

/// Numeric marker-expression matrix (cells × markers), stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    column_names: Vec<String>,
    n_rows: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Build from explicit rows. Returns `None` if the rows are ragged.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<f64>>) -> Option<Self> {
        let n_cols = column_names.len();
        if rows.iter().any(|r| r.len() != n_cols) {
            return None;
        }
        let n_rows = rows.len();
        Some(Matrix {
            column_names,
            n_rows,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        let k = self.n_cols();
        &self.values[idx * k..(idx + 1) * k]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Replace the column names. Panics if the count differs.
    pub fn with_column_names(mut self, names: Vec<String>) -> Self {
        assert_eq!(names.len(), self.n_cols(), "column name count must match width");
        self.column_names = names;
        self
    }

    /// Keep only the rows whose index passes `keep`.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let k = self.n_cols();
        let mut kept = Vec::with_capacity(self.values.len());
        let mut n_kept = 0;
        for i in 0..self.n_rows {
            if keep(i) {
                kept.extend_from_slice(&self.values[i * k..(i + 1) * k]);
                n_kept += 1;
            }
        }
        self.values = kept;
        self.n_rows = n_kept;
    }

    /// Truncate trailing columns or pad with `fill` so the matrix has
    /// exactly `names.len()` columns, then adopt `names`.
    pub fn conform(self, names: Vec<String>, fill: f64) -> Self {
        let old_k = self.n_cols();
        let new_k = names.len();
        if old_k == new_k {
            return self.with_column_names(names);
        }
        let mut values = Vec::with_capacity(self.n_rows * new_k);
        for row in self.rows() {
            if new_k <= old_k {
                values.extend_from_slice(&row[..new_k]);
            } else {
                values.extend_from_slice(row);
                values.extend(std::iter::repeat(fill).take(new_k - old_k));
            }
        }
        Matrix {
            column_names: names,
            n_rows: self.n_rows,
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// MarkerSchema – synthetic column identifiers M0..M(k-1)
// ---------------------------------------------------------------------------

/// Synthetic marker names derived from the training matrix width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSchema {
    names: Vec<String>,
}

impl MarkerSchema {
    pub fn from_width(width: usize) -> Self {
        MarkerSchema {
            names: (0..width).map(|i| format!("M{i}")).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Display for MarkerSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.names.as_slice() {
            [] => write!(f, "<no markers>"),
            [only] => write!(f, "{only}"),
            [first, .., last] => write!(f, "{first}..{last}"),
        }
    }
}

// ---------------------------------------------------------------------------
// LabeledTable – training matrix joined with its labels
// ---------------------------------------------------------------------------

/// Training data: markers under the marker schema plus one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub schema: MarkerSchema,
    pub markers: Matrix,
    pub labels: Vec<String>,
}

impl LabeledTable {
    /// Number of labeled cells.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Marker names followed by the label column name.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.schema.names().to_vec();
        names.push(LABEL_COLUMN.to_string());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn schema_names_follow_width() {
        let schema = MarkerSchema::from_width(3);
        assert_eq!(schema.names(), &strings(&["M0", "M1", "M2"])[..]);
        assert_eq!(schema.to_string(), "M0..M2");
        assert!(MarkerSchema::from_width(0).is_empty());
    }

    #[test]
    fn missing_cells_become_nan() {
        let table = Table::new(
            strings(&["0", "1"]),
            vec![strings(&["1.5", "NA"]), strings(&["", "-2"])],
        );
        let m = table.to_matrix("cells").unwrap();
        assert_eq!(m.row(0)[0], 1.5);
        assert!(m.row(0)[1].is_nan());
        assert!(m.row(1)[0].is_nan());
        assert_eq!(m.row(1)[1], -2.0);
    }

    #[test]
    fn padded_numbers_and_markers_parse() {
        let table = Table::new(strings(&["0", "1"]), vec![strings(&[" 1.5", " NA "])]);
        let m = table.to_matrix("cells").unwrap();
        assert_eq!(m.row(0)[0], 1.5);
        assert!(m.row(0)[1].is_nan());
    }

    #[test]
    fn non_numeric_cell_is_reported_with_position() {
        let table = Table::new(strings(&["0"]), vec![strings(&["1"]), strings(&["CD4+"])]);
        let err = table.to_matrix("cells.csv").unwrap_err();
        match err {
            PipelineError::NonNumeric { row, column, value, .. } => {
                assert_eq!((row, column), (1, 0));
                assert_eq!(value, "CD4+");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn conform_pads_and_truncates() {
        let m = Matrix::from_rows(strings(&["a", "b"]), vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .unwrap();

        let wide = m.clone().conform(MarkerSchema::from_width(3).names().to_vec(), f64::NAN);
        assert_eq!(wide.n_cols(), 3);
        assert_eq!(&wide.row(1)[..2], &[3.0, 4.0]);
        assert!(wide.row(1)[2].is_nan());

        let narrow = m.conform(MarkerSchema::from_width(1).names().to_vec(), f64::NAN);
        assert_eq!(narrow.column_names(), &strings(&["M0"])[..]);
        assert_eq!(narrow.row(0), &[1.0]);
        assert_eq!(narrow.row(1), &[3.0]);
    }

    #[test]
    fn retain_rows_keeps_order() {
        let mut m = Matrix::from_rows(
            strings(&["a"]),
            vec![vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap();
        m.retain_rows(|i| i != 1);
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.row(1), &[3.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Matrix::from_rows(strings(&["a", "b"]), vec![vec![1.0]]).is_none());
    }
}
