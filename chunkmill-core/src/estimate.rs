//! Picks one chunk size for a whole tree from its file-size distribution.

use rayon::slice::ParallelSliceMut;
use tracing::debug;

use crate::config::ChunkSizeBounds;
use crate::error::Result;
use crate::walk::Tree;

/// Walks `tree` once and estimates the chunk size for it.
pub fn estimate(tree: &Tree, bounds: &ChunkSizeBounds) -> Result<u64> {
    bounds.validate()?;
    let sizes = tree.file_sizes()?;
    let chunk_size = estimate_from_sizes(sizes, bounds);
    debug!(root = %tree.root().display(), chunk_size, "estimated chunk size");
    Ok(chunk_size)
}

/// Geometric mean of the 90th-percentile and the average file size,
/// clamped and aligned, then shrunk so the tree yields enough chunks.
///
/// `bounds` must be valid (see [`ChunkSizeBounds::validate`]).
pub fn estimate_from_sizes(mut sizes: Vec<u64>, bounds: &ChunkSizeBounds) -> u64 {
    if sizes.is_empty() {
        return bounds.min;
    }
    sizes.par_sort_unstable();

    let total: u64 = sizes.iter().sum();
    let p90 = sizes[(sizes.len() as f64 * 0.9) as usize];
    let avg = total / sizes.len() as u64;
    let geo = (p90 as f64 * avg as f64).sqrt() as u64;

    let mut chunk_size = geo.clamp(bounds.min, bounds.max);
    chunk_size = chunk_size / bounds.alignment * bounds.alignment;
    chunk_size = chunk_size.max(1);

    if total / chunk_size < bounds.min_total_chunks {
        chunk_size = total / bounds.min_total_chunks.max(1);
    }
    chunk_size.max(bounds.min)
}
