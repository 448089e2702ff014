//! Rebuilds a tree from a manifest and its chunk artifacts.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::chunker::{ArtifactStore, FILE_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::manifest::{Chunk, Manifest};
use crate::path_safety::{manifest_rel_path, validate_path};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub files: u64,
    pub bytes: u64,
}

/// Writes every manifest entry under `dest`, decoding its artifacts from
/// `chunks_dir` in `ChunksIds` order.
pub fn restore(manifest: &Manifest, chunks_dir: &Path, dest: &Path) -> Result<RestoreReport> {
    fs::create_dir_all(dest).map_err(|e| Error::create_dir(dest, e))?;
    let store = ArtifactStore::new(chunks_dir);

    let bytes = manifest
        .chunks
        .par_iter()
        .map(|entry| restore_entry(&store, entry, dest))
        .try_reduce(|| 0u64, |a, b| Ok(a + b))?;

    let report = RestoreReport { files: manifest.chunks.len() as u64, bytes };
    info!(name = %manifest.name, files = report.files, bytes = report.bytes, "restore finished");
    Ok(report)
}

fn restore_entry(store: &ArtifactStore, entry: &Chunk, dest: &Path) -> Result<u64> {
    let target = validate_path(dest, &manifest_rel_path(&entry.source_file))?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::create_dir(parent, e))?;
    }
    let f = File::create(&target).map_err(|e| Error::io(&target, e))?;
    let mut out = BufWriter::with_capacity(FILE_BUFFER_SIZE, f);
    let mut written = 0u64;
    for &id in &entry.chunk_ids {
        written += store.read_into(id, &mut out)?;
    }
    out.flush().map_err(|e| Error::io(&target, e))?;
    if written != entry.file_size {
        return Err(Error::SizeMismatch { path: target, expected: entry.file_size, actual: written });
    }
    debug!(file = %target.display(), bytes = written, "restored");
    Ok(written)
}
