use chunkmill_core::ids::ChunkIdAllocator;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn allocations_are_contiguous_and_disjoint() {
    let ids = ChunkIdAllocator::new(1);
    assert_eq!(ids.allocate(3), Some(1..4));
    assert_eq!(ids.allocate(0), Some(4..4));
    assert_eq!(ids.allocate(2), Some(4..6));
    assert_eq!(ids.peek(), 6);
    assert_eq!(ids.allocated(), 5);
}

#[test]
fn exhausted_id_space_is_refused_without_moving_the_counter() {
    let ids = ChunkIdAllocator::new(u64::MAX - 2);
    assert_eq!(ids.allocate(5), None);
    assert_eq!(ids.peek(), u64::MAX - 2);
    assert_eq!(ids.allocate(2), Some(u64::MAX - 2..u64::MAX));
    assert_eq!(ids.allocate(1), None);
}

#[test]
fn reset_restarts_from_the_first_id() {
    let mut ids = ChunkIdAllocator::new(10);
    ids.allocate(7).unwrap();
    ids.reset();
    assert_eq!(ids.peek(), 10);
    assert_eq!(ids.allocated(), 0);
    assert_eq!(ChunkIdAllocator::default().peek(), 1);
}

#[test]
fn concurrent_allocations_never_overlap() {
    let ids = Arc::new(ChunkIdAllocator::new(1));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || (0..200).map(|i| ids.allocate(1 + (t + i) % 4).unwrap()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    let mut total = 0u64;
    for h in handles {
        for r in h.join().unwrap() {
            total += r.end - r.start;
            for id in r {
                assert!(seen.insert(id), "id {id} handed out twice");
            }
        }
    }
    assert_eq!(seen.len() as u64, total);
    assert_eq!(ids.allocated(), total);
}
