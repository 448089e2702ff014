//! Error types for chunking, manifest assembly and restore.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur anywhere in the chunking pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tree could not be walked, or a path could not be inspected.
    #[error("scan {}: {source}", path.display())]
    Scan { path: PathBuf, source: io::Error },

    /// Open/seek/read/write/close failed on a source, artifact or manifest file.
    #[error("io {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The chunk output directory or a manifest parent directory could not be created.
    #[error("create dir {}: {source}", path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    /// A per-file failure, tagged with the source file that caused it.
    #[error("{}: {source}", path.display())]
    Generation { path: PathBuf, source: Box<Error> },

    /// The manifest could not be encoded or decoded.
    #[error("manifest {}: {source}", path.display())]
    Serialization { path: PathBuf, source: serde_json::Error },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A manifest entry names a path that would land outside the restore root.
    #[error("unsafe path: {0}")]
    UnsafePath(String),

    /// A restored file does not have the size recorded in the manifest.
    #[error("size mismatch for {}: manifest says {expected} bytes, restored {actual}", path.display())]
    SizeMismatch { path: PathBuf, expected: u64, actual: u64 },

    #[error("worker thread panicked")]
    WorkerPanicked,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn scan(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Scan { path: path.into(), source }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::DirectoryCreation { path: path.into(), source }
    }

    /// Wraps a per-file failure with the offending source path.
    pub fn generation(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Generation { path: path.into(), source: Box::new(source) }
    }

    /// Converts a walkdir failure, keeping the path it was visiting when known.
    pub(crate) fn walk(root: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_else(|| root.to_path_buf());
        Error::Scan { path, source: io::Error::from(err) }
    }

    /// The source path a [`Error::Generation`] is tagged with.
    pub fn failed_path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Generation { path, .. } => Some(path),
            _ => None,
        }
    }
}
