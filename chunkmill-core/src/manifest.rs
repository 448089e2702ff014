use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::PathStyle;
use crate::error::{Error, Result};
use crate::ids::ChunkId;

/// One source file: its chunk identifiers in file-offset order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    #[serde(rename = "ChunksIds")]
    pub chunk_ids: Vec<ChunkId>,
    #[serde(rename = "File")]
    pub source_file: String,
    #[serde(rename = "FileSize")]
    pub file_size: u64,
}

/// Index mapping every file of a tree to the chunks that rebuild it.
/// Field names are part of the on-disk format.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Chunks")]
    pub chunks: Vec<Chunk>,
    #[serde(rename = "Size")]
    pub total_size: u64,
}

impl Manifest {
    pub fn file_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of chunk identifiers across all files.
    pub fn chunk_count(&self) -> usize {
        self.chunks.iter().map(|c| c.chunk_ids.len()).sum()
    }

    /// Writes pretty JSON (two-space indent, trailing newline), creating
    /// missing parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::create_dir(parent, e))?;
        }
        let f = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)
            .map_err(|e| Error::Serialization { path: path.to_path_buf(), source: e })?;
        w.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        w.flush().map_err(|e| Error::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| Error::Serialization { path: path.to_path_buf(), source: e })
    }
}

/// What a worker reports for one finished file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileResult {
    pub chunk_ids: Vec<ChunkId>,
    /// Relative to the input root, `/`-separated.
    pub relative_path: String,
    pub size: u64,
}

/// Folds file results, in whatever order they finish, into a manifest.
pub struct ManifestAssembler {
    name: String,
    path_style: PathStyle,
    chunks: Vec<Chunk>,
    total_size: u64,
    chunk_count: usize,
}

impl ManifestAssembler {
    pub fn new(name: impl Into<String>, path_style: PathStyle) -> Self {
        Self { name: name.into(), path_style, chunks: Vec::new(), total_size: 0, chunk_count: 0 }
    }

    pub fn push(&mut self, res: FileResult) {
        self.total_size += res.size;
        self.chunk_count += res.chunk_ids.len();
        self.chunks.push(Chunk {
            chunk_ids: res.chunk_ids,
            source_file: self.path_style.from_slash(&res.relative_path),
            file_size: res.size,
        });
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn finish(self) -> Manifest {
        Manifest { name: self.name, chunks: self.chunks, total_size: self.total_size }
    }
}
