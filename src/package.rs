//! Result packaging: staged prediction files → one `.tar.gz`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{PipelineError, Result};
use crate::staging::{StagedFile, Staging};

/// Write every staged file into a gzip-compressed tar at `output`.
///
/// An existing file at `output` is removed first. Members are flat, named by
/// the staged file name, in staging order. A partially written archive is
/// removed if packaging fails.
pub fn package<S: Staging + ?Sized>(
    staging: &S,
    staged: &[StagedFile],
    output: &Path,
    compression: Compression,
) -> Result<()> {
    remove_existing(output)?;

    let result = File::create(output)
        .map_err(|e| PipelineError::io(format!("creating {}", output.display()), e))
        .and_then(|file| write_archive(staging, staged, BufWriter::new(file), compression))
        .and_then(|mut writer| {
            writer
                .flush()
                .map_err(|e| PipelineError::io(format!("flushing {}", output.display()), e))
        });

    if let Err(err) = result {
        let _ = std::fs::remove_file(output);
        return Err(err);
    }

    log::info!("Packed {} prediction file(s) into {}", staged.len(), output.display());
    Ok(())
}

/// Delete a previous run's archive at `output`, if there is one.
pub fn remove_existing(output: &Path) -> Result<()> {
    match std::fs::remove_file(output) {
        Ok(()) => {
            log::info!("Removed existing {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(format!("removing {}", output.display()), e)),
    }
}

/// Write the archive to `writer` and hand the finished writer back.
pub fn write_archive<S, W>(
    staging: &S,
    staged: &[StagedFile],
    writer: W,
    compression: Compression,
) -> Result<W>
where
    S: Staging + ?Sized,
    W: Write,
{
    let archive_err = |e: std::io::Error| PipelineError::io("writing output archive", e);
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut builder = tar::Builder::new(GzEncoder::new(writer, compression));
    for file in staged {
        let contents = staging.read(file)?;
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        builder
            .append_data(&mut header, &file.file_name, contents.as_slice())
            .map_err(archive_err)?;
    }

    let encoder = builder.into_inner().map_err(archive_err)?;
    encoder.finish().map_err(archive_err)
}
