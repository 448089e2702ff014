//! Splits files into fixed-size byte ranges and writes each range as a
//! standalone zstd artifact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ids::{ChunkId, ChunkIdAllocator};

/// Write buffer placed between the compressor and each artifact file.
pub const FILE_BUFFER_SIZE: usize = 4 * 1024 * 1024;
pub const ARTIFACT_EXT: &str = "chunk";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub len: u64,
}

/// The ranges covering a file of `file_size` bytes, in offset order.
/// Every range is `chunk_size` long except possibly the last.
pub fn byte_ranges(file_size: u64, chunk_size: u64) -> impl Iterator<Item = ByteRange> {
    assert!(chunk_size > 0, "chunk size must be > 0");
    let n = file_size.div_ceil(chunk_size);
    (0..n).map(move |i| {
        let offset = i * chunk_size;
        ByteRange { offset, len: chunk_size.min(file_size - offset) }
    })
}

/// Output of [`Chunker::calculate`]: which identifiers cover a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChunks {
    pub path: PathBuf,
    pub size: u64,
    pub ids: Vec<ChunkId>,
}

/// Directory that holds chunk artifacts, one `<id>.chunk` file per chunk.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the directory if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::create_dir(&self.dir, e))
    }

    pub fn path_for(&self, id: ChunkId) -> PathBuf {
        self.dir.join(format!("{id}.{ARTIFACT_EXT}"))
    }

    /// Decompresses artifact `id` into `out`, returning the decoded length.
    pub fn read_into<W: Write>(&self, id: ChunkId, out: &mut W) -> Result<u64> {
        let path = self.path_for(id);
        let f = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let mut decoder = zstd::stream::read::Decoder::new(f).map_err(|e| Error::io(&path, e))?;
        io::copy(&mut decoder, out).map_err(|e| Error::io(&path, e))
    }
}

pub struct Chunker {
    chunk_size: u64,
    compression_level: i32,
    ids: ChunkIdAllocator,
    store: ArtifactStore,
}

impl Chunker {
    pub fn new(chunk_size: u64, ids: ChunkIdAllocator, store: ArtifactStore) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be > 0".into()));
        }
        Ok(Self {
            chunk_size,
            compression_level: crate::config::DEFAULT_COMPRESSION_LEVEL,
            ids,
            store,
        })
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn ids(&self) -> &ChunkIdAllocator {
        &self.ids
    }

    /// Rewinds the identifier counter between independent runs.
    pub fn reset_ids(&mut self) {
        self.ids.reset();
    }

    /// Stats `path` and reserves one identifier per byte range.
    /// A zero-length file gets no identifiers.
    pub fn calculate(&self, path: &Path) -> Result<FileChunks> {
        let size = fs::metadata(path).map_err(|e| Error::scan(path, e))?.len();
        let n = size.div_ceil(self.chunk_size);
        let ids = match n {
            0 => Vec::new(),
            n => self
                .ids
                .allocate(n)
                .ok_or_else(|| Error::Config(format!("chunk id space exhausted at {}", self.ids.peek())))?
                .collect(),
        };
        Ok(FileChunks { path: path.to_path_buf(), size, ids })
    }

    /// Writes one compressed artifact per byte range of `file`.
    ///
    /// `file` must come from [`Chunker::calculate`] on this chunker. A range
    /// that fails removes its partial artifact; artifacts already completed
    /// for other ranges are kept.
    pub fn generate_chunks(&self, file: &FileChunks) -> Result<()> {
        if file.ids.is_empty() {
            return Ok(());
        }
        self.store.prepare()?;
        let ranges: Vec<ByteRange> = byte_ranges(file.size, self.chunk_size).collect();
        if ranges.len() != file.ids.len() {
            return Err(Error::Config(format!(
                "{} ids for {} ranges; calculated with another chunk size?",
                file.ids.len(),
                ranges.len()
            )));
        }
        ranges
            .par_iter()
            .zip(file.ids.par_iter())
            .try_for_each(|(range, &id)| self.write_artifact(&file.path, *range, id))
    }

    fn write_artifact(&self, src: &Path, range: ByteRange, id: ChunkId) -> Result<()> {
        let out = self.store.path_for(id);
        debug!(chunk = id, src = %src.display(), offset = range.offset, len = range.len, "writing chunk");

        let mut f = File::open(src).map_err(|e| Error::io(src, e))?;
        f.seek(SeekFrom::Start(range.offset)).map_err(|e| Error::io(src, e))?;
        // Nothing to clean up unless the artifact was created by this call.
        let dst = File::create(&out).map_err(|e| Error::io(&out, e))?;

        let res = self.copy_compressed(f, src, dst, &out, range);
        if res.is_err() {
            if let Err(e) = fs::remove_file(&out) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %out.display(), error = %e, "could not remove partial chunk");
                }
            }
        }
        res
    }

    fn copy_compressed(&self, f: File, src: &Path, dst: File, out: &Path, range: ByteRange) -> Result<()> {
        let writer = BufWriter::with_capacity(FILE_BUFFER_SIZE, dst);
        let mut encoder = zstd::stream::write::Encoder::new(writer, self.compression_level)
            .map_err(|e| Error::io(out, e))?;

        let copied = io::copy(&mut f.take(range.len), &mut encoder).map_err(|e| Error::io(src, e))?;
        if copied != range.len {
            return Err(Error::io(
                src,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes at offset {}, read {}", range.len, range.offset, copied),
                ),
            ));
        }

        let writer = encoder.finish().map_err(|e| Error::io(out, e))?;
        writer.into_inner().map_err(|e| Error::io(out, e.into_error()))?;
        Ok(())
    }
}
