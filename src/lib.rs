//! Archive-based batch classification of cytometry samples.
//!
//! A classifier is trained on a headerless marker matrix plus labels, then
//! applied to every `.csv` entry of a test archive; per-entry predictions
//! are gzip-compressed and packed into a single `.tar.gz`.

pub mod archive;
pub mod batch;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod staging;
pub mod training;

pub use classifier::{Classifier, Model, NearestCentroid, Prediction};
pub use config::{EntryOrder, RunConfig};
pub use data::align::WidthPolicy;
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{run, RunPaths, RunSummary};
