//! Fixture helpers shared by the integration tests.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn tar_gz(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *data).unwrap();
    }
    gzip(&builder.into_inner().unwrap())
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Members of an output archive with their gunzipped text.
pub fn read_predictions(archive: &Path) -> Vec<(String, Vec<String>)> {
    let bytes = std::fs::read(archive).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(bytes.as_slice()));
    archive
        .entries()
        .unwrap()
        .map(|e| {
            let mut e = e.unwrap();
            let name = e.path().unwrap().to_string_lossy().into_owned();
            let mut packed = Vec::new();
            e.read_to_end(&mut packed).unwrap();
            let mut text = String::new();
            GzDecoder::new(packed.as_slice())
                .read_to_string(&mut text)
                .unwrap();
            (name, text.lines().map(str::to_string).collect())
        })
        .collect()
}

/// Training data where M0 < 5 is "A" and M0 >= 5 is "B".
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub train_matrix: PathBuf,
    pub train_labels: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let train_matrix = write(dir.path(), "train.csv", b"0,1\n10,1\n1,0\n");
        let train_labels = write(dir.path(), "labels.csv", b"A\nB\nA\n");
        Fixture {
            dir,
            train_matrix,
            train_labels,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn test_archive(&self, members: &[(&str, &[u8])]) -> PathBuf {
        write(self.dir.path(), "test.tar.gz", &tar_gz(members))
    }
}
