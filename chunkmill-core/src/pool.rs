//! Bounded worker pool that chunks files and streams per-file results.
//!
//! ```text
//!  producer ──files (bounded)──▶ N workers ──results (bounded)──▶ caller's sink
//!                                   │
//!                                   └── first error ──▶ AbortSignal (one slot)
//! ```
//!
//! The producer blocks while the file queue is full and workers block while
//! the result queue is full, so memory stays bounded for any tree size. After
//! the first failure no new file is started; files already in the queue are
//! drained without being processed and the error is returned once every
//! worker has exited.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::manifest::FileResult;
use crate::progress::Progress;
use crate::walk;

/// Single-slot, set-once error signal shared by the producer and the workers.
pub struct AbortSignal {
    tripped: AtomicBool,
    tx: Sender<Error>,
    rx: Receiver<Error>,
}

impl AbortSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tripped: AtomicBool::new(false), tx, rx }
    }

    /// Records `err` unless an earlier error already won. Returns whether it did.
    pub fn raise(&self, err: Error) -> bool {
        if self.tripped.swap(true, Ordering::AcqRel) {
            debug!(error = %err, "dropping error after abort");
            return false;
        }
        self.tx.try_send(err).is_ok()
    }

    pub fn is_raised(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    pub fn take(&self) -> Option<Error> {
        self.rx.try_recv().ok()
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_depth: usize,
}

pub struct ParallelProcessor<'a> {
    chunker: &'a Chunker,
    root: &'a Path,
    progress: &'a Progress,
    cfg: PoolConfig,
}

impl<'a> ParallelProcessor<'a> {
    pub fn new(chunker: &'a Chunker, root: &'a Path, progress: &'a Progress, cfg: PoolConfig) -> Self {
        Self { chunker, root, progress, cfg }
    }

    /// Chunks one file: reserve identifiers, then write the artifacts.
    pub fn process_file(&self, path: &Path) -> Result<FileResult> {
        let file = self.chunker.calculate(path)?;
        self.chunker.generate_chunks(&file)?;
        Ok(FileResult {
            relative_path: walk::relative_slash_path(path, self.root),
            size: file.size,
            chunk_ids: file.ids,
        })
    }

    /// Processes every path from `files` exactly once, handing each result to
    /// `sink` on the calling thread in completion order.
    ///
    /// Fails with the first error raised by the producer or any worker;
    /// results already delivered to `sink` belong to a failed run then.
    pub fn run<I, F>(&self, files: I, mut sink: F) -> Result<()>
    where
        I: IntoIterator<Item = Result<PathBuf>>,
        I::IntoIter: Send,
        F: FnMut(FileResult),
    {
        let workers = self.cfg.workers.max(1);
        let depth = self.cfg.queue_depth.max(1);
        let (file_tx, file_rx) = bounded::<PathBuf>(depth);
        let (result_tx, result_rx) = bounded::<FileResult>(depth);
        let abort = AbortSignal::new();
        let files = files.into_iter();

        let panicked = thread::scope(|s| {
            let abort = &abort;
            let mut handles = Vec::with_capacity(workers + 1);

            handles.push(s.spawn(move || {
                for item in files {
                    if abort.is_raised() {
                        break;
                    }
                    match item {
                        Ok(path) => {
                            if file_tx.send(path).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            abort.raise(e);
                            break;
                        }
                    }
                }
            }));

            for _ in 0..workers {
                let rx = file_rx.clone();
                let tx = result_tx.clone();
                handles.push(s.spawn(move || {
                    for path in rx.iter() {
                        if abort.is_raised() {
                            continue;
                        }
                        match self.process_file(&path) {
                            Ok(res) => {
                                let size = res.size;
                                if tx.send(res).is_err() {
                                    break;
                                }
                                self.progress.file_done(size);
                            }
                            Err(e) => {
                                abort.raise(Error::generation(path, e));
                            }
                        }
                    }
                }));
            }
            drop(file_rx);
            drop(result_tx);

            for res in result_rx.iter() {
                sink(res);
            }

            handles.into_iter().fold(false, |acc, h| h.join().is_err() || acc)
        });

        if let Some(err) = abort.take() {
            return Err(err);
        }
        if panicked {
            return Err(Error::WorkerPanicked);
        }
        Ok(())
    }
}
