use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

pub type ChunkId = u64;

/// Run-wide source of chunk identifiers.
///
/// Identifiers are handed out by an atomic checked add and are never
/// reused within a run. A whole file's identifiers are reserved with one
/// atomic update, so they are contiguous even when files are processed
/// concurrently.
#[derive(Debug)]
pub struct ChunkIdAllocator {
    start: ChunkId,
    next: AtomicU64,
}

impl ChunkIdAllocator {
    pub fn new(start: ChunkId) -> Self {
        Self { start, next: AtomicU64::new(start) }
    }

    /// Reserves `n` consecutive identifiers, or `None` once the id space
    /// is exhausted. A failed reservation leaves the counter untouched.
    pub fn allocate(&self, n: u64) -> Option<Range<ChunkId>> {
        let first = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| cur.checked_add(n))
            .ok()?;
        Some(first..first + n)
    }

    /// The identifier the next allocation will return.
    pub fn peek(&self) -> ChunkId {
        self.next.load(Ordering::Relaxed)
    }

    /// Number of identifiers handed out since construction or the last reset.
    pub fn allocated(&self) -> u64 {
        self.peek() - self.start
    }

    /// Rewinds to the start value for an independent run.
    ///
    /// Takes `&mut self`: no allocation can be in flight while it runs.
    pub fn reset(&mut self) {
        *self.next.get_mut() = self.start;
    }
}

impl Default for ChunkIdAllocator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FIRST_CHUNK_ID)
    }
}
