//! Run configuration.

use clap::ValueEnum;
use flate2::Compression;

use crate::data::align::WidthPolicy;
use crate::data::loader::LoadOptions;

/// Order in which test entries are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EntryOrder {
    /// As the archive yields them, streaming.
    #[default]
    Archive,
    /// Sorted by member name. Buffers all entries first.
    ByName,
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub width_policy: WidthPolicy,
    pub entry_order: EntryOrder,
    pub delimiter: u8,
    /// gzip level, 0–9.
    pub compression_level: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            width_policy: WidthPolicy::default(),
            entry_order: EntryOrder::default(),
            delimiter: b',',
            compression_level: 9,
        }
    }
}

impl RunConfig {
    pub fn compression(&self) -> Compression {
        Compression::new(self.compression_level.min(9))
    }

    /// Options for headerless tabular sources.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::headerless(self.delimiter)
    }
}
