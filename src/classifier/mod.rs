//! Classifier contract consumed by the pipeline.
//!
//! The pipeline treats the classifier as a black box: train once on the
//! labeled training table, then predict one label per row of each test
//! entry. Errors are opaque `anyhow` errors and are surfaced unchanged.

use std::fmt::Display;

use crate::data::model::{LabeledTable, Matrix};

pub mod centroid;

pub use centroid::NearestCentroid;

/// Output of [`Model::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<L> {
    /// One label per input row, in row order.
    pub labels: Vec<L>,
    /// Per-row auxiliary scores. Not used by the pipeline.
    pub scores: Vec<f64>,
}

/// A trained model.
pub trait Model {
    type Label: Display;

    fn predict(&self, markers: &Matrix) -> anyhow::Result<Prediction<Self::Label>>;
}

/// Something that can be trained into a [`Model`].
pub trait Classifier {
    type Model: Model;

    fn train(&self, table: &LabeledTable) -> anyhow::Result<Self::Model>;
}
