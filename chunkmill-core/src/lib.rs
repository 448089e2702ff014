//! Splits a build tree into uniformly sized, independently compressed chunk
//! artifacts and describes how to reassemble it in a manifest.

pub mod chunker;
pub mod config;
pub mod error;
pub mod estimate;
pub mod generate;
pub mod ids;
pub mod manifest;
pub mod path_safety;
pub mod pool;
pub mod progress;
pub mod restore;
pub mod walk;

pub use config::{ChunkSizeBounds, GeneratorConfig, PathStyle};
pub use error::{Error, Result};
pub use generate::Generator;
pub use manifest::{Chunk, FileResult, Manifest, ManifestAssembler};
