//! Test-archive access.
//!
//! The batch driver only sees [`EntrySource`]; the tar-backed source reads a
//! file on disk, the in-memory source serves fixtures without touching the
//! filesystem.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{PipelineError, Result};

/// Suffix that marks a member or file as delimited text.
pub const TABULAR_SUFFIX: &str = ".csv";

const ARCHIVE_SUFFIXES: &[&str] = &[".tar", ".tar.gz", ".tgz"];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_tabular_name(name: &str) -> bool {
    name.ends_with(TABULAR_SUFFIX)
}

/// Whether the file name follows the bundled-archive convention.
pub fn is_archive_name(name: &str) -> bool {
    ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Wrap `reader` in a gzip decoder if the stream starts with the gzip magic.
pub(crate) fn sniff_gzip<R: BufRead + 'static>(mut reader: R) -> std::io::Result<Box<dyn Read>> {
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open a tar archive, compressed or not.
pub(crate) fn open_tar(path: &Path) -> std::io::Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(path)?;
    Ok(tar::Archive::new(sniff_gzip(BufReader::new(file))?))
}

// ---------------------------------------------------------------------------
// EntrySource
// ---------------------------------------------------------------------------

/// A collection of named tabular entries, visited one at a time.
pub trait EntrySource {
    /// Where the entries come from, for messages.
    fn origin(&self) -> PathBuf;

    /// Call `visit` for every tabular regular-file entry, in source order.
    ///
    /// Stops at the first error returned by `visit`. Returns the number of
    /// entries visited.
    fn visit_entries(
        &mut self,
        visit: &mut dyn FnMut(&str, &mut dyn Read) -> Result<()>,
    ) -> Result<usize>;
}

/// Entries of a tar (optionally gzip-compressed) archive on disk.
#[derive(Debug, Clone)]
pub struct TarEntrySource {
    path: PathBuf,
}

impl TarEntrySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TarEntrySource { path: path.into() }
    }
}

impl EntrySource for TarEntrySource {
    fn origin(&self) -> PathBuf {
        self.path.clone()
    }

    fn visit_entries(
        &mut self,
        visit: &mut dyn FnMut(&str, &mut dyn Read) -> Result<()>,
    ) -> Result<usize> {
        let context = || format!("reading test archive {}", self.path.display());

        // The archive handle lives for this call only and is dropped on every
        // exit path, including a failing visitor.
        let mut archive = open_tar(&self.path).map_err(|e| PipelineError::io(context(), e))?;
        let entries = archive
            .entries()
            .map_err(|e| PipelineError::io(context(), e))?;

        let mut visited = 0;
        for entry in entries {
            let mut entry = entry.map_err(|e| PipelineError::io(context(), e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .map_err(|e| PipelineError::io(context(), e))?
                .to_string_lossy()
                .into_owned();
            if !is_tabular_name(&name) {
                log::debug!("Skipping non-tabular member {name}");
                continue;
            }
            visit(&name, &mut entry)?;
            visited += 1;
        }
        Ok(visited)
    }
}

/// Entries held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntrySource {
    entries: Vec<(String, Vec<u8>)>,
}

impl MemoryEntrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.into(), contents.into()));
        self
    }
}

impl EntrySource for MemoryEntrySource {
    fn origin(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }

    fn visit_entries(
        &mut self,
        visit: &mut dyn FnMut(&str, &mut dyn Read) -> Result<()>,
    ) -> Result<usize> {
        let mut visited = 0;
        for (name, contents) in &self.entries {
            if !is_tabular_name(name) {
                continue;
            }
            visit(name, &mut contents.as_slice())?;
            visited += 1;
        }
        Ok(visited)
    }
}
