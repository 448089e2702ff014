use std::path::PathBuf;

use crate::error::{Error, Result};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 512 * KIB;
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 10 * MIB;
pub const DEFAULT_CHUNK_ALIGNMENT: u64 = 64 * KIB;
/// Below this many chunks for the whole tree the estimator shrinks the chunk size.
pub const DEFAULT_MIN_TOTAL_CHUNKS: u64 = 100;
pub const DEFAULT_CHUNKS_DIR: &str = "chunks";
pub const DEFAULT_FIRST_CHUNK_ID: u64 = 1;
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// Limits applied to the estimated chunk size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSizeBounds {
    pub min: u64,
    pub max: u64,
    /// Estimated sizes are rounded down to a multiple of this.
    pub alignment: u64,
    pub min_total_chunks: u64,
}

impl Default for ChunkSizeBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CHUNK_SIZE,
            max: DEFAULT_MAX_CHUNK_SIZE,
            alignment: DEFAULT_CHUNK_ALIGNMENT,
            min_total_chunks: DEFAULT_MIN_TOTAL_CHUNKS,
        }
    }
}

impl ChunkSizeBounds {
    pub fn validate(&self) -> Result<()> {
        if self.min == 0 {
            return Err(Error::Config("minimum chunk size must be > 0".into()));
        }
        if self.alignment == 0 {
            return Err(Error::Config("chunk alignment must be > 0".into()));
        }
        if self.min > self.max {
            return Err(Error::Config(format!(
                "minimum chunk size {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Separator used for `File` paths written into the manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathStyle {
    /// `dir\file.bin`, what existing manifest consumers expect.
    #[default]
    Windows,
    /// `dir/file.bin`
    Unix,
}

impl PathStyle {
    pub fn separator(self) -> char {
        match self {
            PathStyle::Windows => '\\',
            PathStyle::Unix => '/',
        }
    }

    /// Converts a `/`-separated relative path into this style.
    pub fn from_slash(self, rel: &str) -> String {
        match self {
            PathStyle::Windows => rel.replace('/', "\\"),
            PathStyle::Unix => rel.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub bounds: ChunkSizeBounds,
    /// Skip estimation and use this chunk size for the run.
    pub chunk_size: Option<u64>,
    pub workers: usize,
    /// Capacity of both the file queue and the result queue.
    pub queue_depth: usize,
    pub chunks_dir: PathBuf,
    pub first_chunk_id: u64,
    pub path_style: PathStyle,
    pub compression_level: i32,
    pub progress: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let workers = default_workers();
        Self {
            bounds: ChunkSizeBounds::default(),
            chunk_size: None,
            workers,
            queue_depth: workers * 10,
            chunks_dir: PathBuf::from(DEFAULT_CHUNKS_DIR),
            first_chunk_id: DEFAULT_FIRST_CHUNK_ID,
            path_style: PathStyle::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            progress: false,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if self.chunk_size == Some(0) {
            return Err(Error::Config("chunk size must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(Error::Config("worker count must be >= 1".into()));
        }
        if self.queue_depth == 0 {
            return Err(Error::Config("queue depth must be >= 1".into()));
        }
        if !zstd::compression_level_range().contains(&self.compression_level) {
            return Err(Error::Config(format!(
                "compression level {} out of range",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Two workers per logical core; chunking is a mix of disk and compression time.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) * 2
}
