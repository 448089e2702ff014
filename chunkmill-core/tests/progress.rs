use chunkmill_core::progress::{Progress, REPORT_EVERY};
use std::sync::atomic::Ordering;
use std::thread;

#[test]
fn counts_files_and_bytes() {
    let p = Progress::new(false);
    p.set_files_total(3);
    assert_eq!(p.file_done(10), 1);
    assert_eq!(p.file_done(0), 2);
    assert_eq!(p.file_done(5), 3);
    assert_eq!(p.files_done(), 3);
    assert_eq!(p.bytes_done.load(Ordering::Relaxed), 15);
    assert_eq!(p.files_total.load(Ordering::Relaxed), 3);
}

#[test]
fn clones_share_counters_across_threads() {
    let p = Progress::new(true);
    p.set_files_total(4 * REPORT_EVERY);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let p = p.clone();
            thread::spawn(move || {
                for _ in 0..REPORT_EVERY {
                    p.file_done(2);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(p.files_done(), 4 * REPORT_EVERY);
    assert_eq!(p.bytes_done.load(Ordering::Relaxed), 8 * REPORT_EVERY);
}
