//! Scratch storage for per-entry prediction files.
//!
//! Staged files are addressed by their flat file name: staging a name twice
//! replaces the earlier contents, exactly as a directory would.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Handle to one staged prediction file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Flat file name, also used as the archive member name.
    pub file_name: String,
    /// Number of prediction records written.
    pub rows: usize,
}

pub trait Staging {
    /// Store `contents` under `file_name`.
    fn stage(&mut self, file_name: &str, rows: usize, contents: &[u8]) -> Result<StagedFile>;

    /// Current contents of a staged file.
    fn read(&self, staged: &StagedFile) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// On-disk scratch directory
// ---------------------------------------------------------------------------

/// Temporary directory removed when dropped, on every exit path.
#[derive(Debug)]
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("cytoclass-")
            .tempdir()
            .map_err(|e| PipelineError::io("creating scratch directory", e))?;
        log::debug!("Scratch directory {}", dir.path().display());
        Ok(ScratchDir { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }
}

impl Staging for ScratchDir {
    fn stage(&mut self, file_name: &str, rows: usize, contents: &[u8]) -> Result<StagedFile> {
        let path = self.file_path(file_name);
        std::fs::write(&path, contents)
            .map_err(|e| PipelineError::io(format!("writing {}", path.display()), e))?;
        Ok(StagedFile {
            file_name: file_name.to_string(),
            rows,
        })
    }

    fn read(&self, staged: &StagedFile) -> Result<Vec<u8>> {
        let path = self.file_path(&staged.file_name);
        std::fs::read(&path).map_err(|e| PipelineError::io(format!("reading {}", path.display()), e))
    }
}

// ---------------------------------------------------------------------------
// In-memory staging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStaging {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Staging for MemoryStaging {
    fn stage(&mut self, file_name: &str, rows: usize, contents: &[u8]) -> Result<StagedFile> {
        self.files.insert(file_name.to_string(), contents.to_vec());
        Ok(StagedFile {
            file_name: file_name.to_string(),
            rows,
        })
    }

    fn read(&self, staged: &StagedFile) -> Result<Vec<u8>> {
        self.files.get(&staged.file_name).cloned().ok_or_else(|| {
            PipelineError::io(
                format!("reading staged file {}", staged.file_name),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let mut scratch = ScratchDir::new().unwrap();
        let root = scratch.path().to_path_buf();
        let staged = scratch.stage("a.predictions.csv.gz", 2, b"xy").unwrap();
        assert_eq!(scratch.read(&staged).unwrap(), b"xy");
        assert!(root.join("a.predictions.csv.gz").exists());

        drop(scratch);
        assert!(!root.exists());
    }

    #[test]
    fn restaging_a_name_overwrites() {
        let mut staging = MemoryStaging::new();
        let first = staging.stage("x", 1, b"old").unwrap();
        staging.stage("x", 1, b"new").unwrap();
        assert_eq!(staging.len(), 1);
        assert_eq!(staging.read(&first).unwrap(), b"new");
    }

    #[test]
    fn unknown_staged_file_is_an_error() {
        let staging = MemoryStaging::new();
        let ghost = StagedFile {
            file_name: "ghost".into(),
            rows: 0,
        };
        assert!(staging.read(&ghost).is_err());
    }
}
