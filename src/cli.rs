//! Command-line surface shared by the binaries.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::config::{EntryOrder, RunConfig};
use crate::data::align::WidthPolicy;
use crate::pipeline::RunPaths;

pub const USAGE: &str =
    "Usage: cytoclass <train_matrix> <train_labels> <test_matrix_tar> <output_tar>";

/// Tuning flags; every flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct TuningArgs {
    /// How to treat test entries whose width differs from the training matrix
    #[arg(long, value_enum, env = "CYTOCLASS_WIDTH_POLICY", default_value_t = WidthPolicy::Relabel)]
    pub width_policy: WidthPolicy,

    /// Order in which test entries are processed
    #[arg(long, value_enum, env = "CYTOCLASS_ENTRY_ORDER", default_value_t = EntryOrder::Archive)]
    pub entry_order: EntryOrder,

    /// Field delimiter of every delimited-text input (single ASCII character)
    #[arg(long, env = "CYTOCLASS_DELIMITER", default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// gzip level for prediction files and the output archive
    #[arg(
        long,
        env = "CYTOCLASS_COMPRESSION_LEVEL",
        default_value_t = 9,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub compression_level: u32,
}

impl TuningArgs {
    pub fn config(&self) -> RunConfig {
        RunConfig {
            width_policy: self.width_policy,
            entry_order: self.entry_order,
            delimiter: self.delimiter,
            compression_level: self.compression_level,
        }
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    let s = match s {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
    }
}

/// Batch-classify cytometry samples with a model trained on a labeled matrix.
#[derive(Parser, Debug)]
#[command(name = "cytoclass", version, about)]
pub struct Cli {
    /// Training marker matrix (headerless; .csv, .csv.gz or .tar.gz)
    pub train_matrix: PathBuf,
    /// Training labels, one per matrix row
    pub train_labels: PathBuf,
    /// Archive of headerless .csv test matrices
    pub test_archive: PathBuf,
    /// Output .tar.gz of per-sample predictions
    pub output: PathBuf,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

impl Cli {
    pub fn paths(&self) -> RunPaths {
        RunPaths {
            train_matrix: self.train_matrix.clone(),
            train_labels: self.train_labels.clone(),
            test_archive: self.test_archive.clone(),
            output: self.output.clone(),
        }
    }
}
