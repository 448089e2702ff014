use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;

/// Files between two progress lines.
pub const REPORT_EVERY: u64 = 100;

#[derive(Clone)]
pub struct Progress {
    enabled: bool,
    pub files_done: Arc<AtomicU64>,
    pub files_total: Arc<AtomicU64>,
    pub bytes_done: Arc<AtomicU64>,
    started: Instant,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            files_done: Arc::new(AtomicU64::new(0)),
            files_total: Arc::new(AtomicU64::new(0)),
            bytes_done: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
        }
    }

    pub fn set_files_total(&self, n: u64) {
        self.files_total.store(n, Ordering::Relaxed);
    }

    /// Records one finished file; prints a line every [`REPORT_EVERY`] files.
    pub fn file_done(&self, bytes: u64) -> u64 {
        self.bytes_done.fetch_add(bytes, Ordering::Relaxed);
        let done = self.files_done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.enabled && done % REPORT_EVERY == 0 {
            eprintln!("{}", self.line(done));
        }
        done
    }

    pub fn files_done(&self) -> u64 {
        self.files_done.load(Ordering::Relaxed)
    }

    fn line(&self, done: u64) -> String {
        let total = self.files_total.load(Ordering::Relaxed);
        let pct = if total > 0 { done as f64 / total as f64 * 100.0 } else { 0.0 };
        let secs = self.started.elapsed().as_secs_f64();
        let rate = if secs > 0.0 { (done as f64 / secs) as u64 } else { done };
        format!("processed {done} files ({pct:.1}%) [{rate}/s]")
    }
}
