use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::chunker::{ArtifactStore, Chunker};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::estimate;
use crate::ids::ChunkIdAllocator;
use crate::manifest::{Manifest, ManifestAssembler};
use crate::pool::{ParallelProcessor, PoolConfig};
use crate::progress::Progress;
use crate::walk::Tree;

/// Runs the whole pipeline for one input tree.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The input tree minus the artifact directory, when that lies inside it.
    fn tree(&self, root: &Path) -> Tree {
        Tree::new(root).excluding(&self.config.chunks_dir)
    }

    /// Chunk size for `root`: the configured override, or an estimate.
    pub fn chunk_size_for(&self, root: &Path) -> Result<u64> {
        self.chunk_size_in(&self.tree(root))
    }

    fn chunk_size_in(&self, tree: &Tree) -> Result<u64> {
        match self.config.chunk_size {
            Some(n) => Ok(n),
            None => estimate::estimate(tree, &self.config.bounds),
        }
    }

    /// Chunks every file under `root` into the artifact directory and returns
    /// the assembled manifest. Any per-file failure fails the whole run.
    pub fn generate(&self, root: &Path) -> Result<Manifest> {
        let started = Instant::now();

        let store = ArtifactStore::new(&self.config.chunks_dir);
        store.prepare()?;
        // Resolved after `prepare` so an artifact directory inside `root` is skipped.
        let tree = self.tree(root);

        let chunk_size = self.chunk_size_in(&tree)?;
        let total_files = tree.count_files()?;
        info!(root = %root.display(), files = total_files, chunk_size, "chunking tree");

        let chunker = Chunker::new(chunk_size, ChunkIdAllocator::new(self.config.first_chunk_id), store)?
            .with_compression_level(self.config.compression_level);

        let progress = Progress::new(self.config.progress);
        progress.set_files_total(total_files);

        let pool = PoolConfig { workers: self.config.workers, queue_depth: self.config.queue_depth };
        let mut assembler = ManifestAssembler::new(manifest_name(root), self.config.path_style);
        ParallelProcessor::new(&chunker, root, &progress, pool)
            .run(tree.file_paths(), |res| {
                debug!(file = %res.relative_path, chunks = res.chunk_ids.len(), "file done");
                assembler.push(res);
            })?;

        info!(
            files = progress.files_done(),
            chunks = assembler.chunk_count(),
            ids = chunker.ids().allocated(),
            bytes = assembler.total_size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chunking finished"
        );
        Ok(assembler.finish())
    }
}

/// Final component of the input directory, resolved so that `.` gets a real name.
pub fn manifest_name(root: &Path) -> String {
    fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| root.display().to_string())
}

