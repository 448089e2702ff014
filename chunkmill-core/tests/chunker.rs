use chunkmill_core::chunker::{ArtifactStore, Chunker};
use chunkmill_core::ids::ChunkIdAllocator;
use chunkmill_core::Error;
use std::fs;

#[test]
fn calculate_reserves_one_id_per_range() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    fs::write(&src, vec![7u8; 10_000]).unwrap();
    fs::write(td.path().join("empty"), b"").unwrap();

    let chunker = Chunker::new(4096, ChunkIdAllocator::new(100), ArtifactStore::new(td.path().join("c"))).unwrap();
    let fc = chunker.calculate(&src).unwrap();
    assert_eq!(fc.size, 10_000);
    assert_eq!(fc.ids, vec![100, 101, 102]);
    let empty = chunker.calculate(&td.path().join("empty")).unwrap();
    assert!(empty.ids.is_empty());
    assert_eq!(chunker.calculate(&src).unwrap().ids, vec![103, 104, 105]);
}

#[test]
fn missing_source_is_a_stat_error() {
    let td = tempfile::tempdir().unwrap();
    let chunker = Chunker::new(4096, ChunkIdAllocator::new(1), ArtifactStore::new(td.path().join("c"))).unwrap();
    let err = chunker.calculate(&td.path().join("gone")).unwrap_err();
    assert!(matches!(err, Error::Scan { .. }));
    assert_eq!(chunker.ids().peek(), 1);
}

#[test]
fn generate_writes_decodable_artifacts() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(&src, &data).unwrap();
    let store = ArtifactStore::new(td.path().join("out/chunks"));

    let chunker = Chunker::new(8192, ChunkIdAllocator::new(1), store.clone()).unwrap();
    let fc = chunker.calculate(&src).unwrap();
    chunker.generate_chunks(&fc).unwrap();

    let mut back = Vec::new();
    for &id in &fc.ids {
        assert!(store.path_for(id).exists());
        store.read_into(id, &mut back).unwrap();
    }
    assert_eq!(back, data);
}

#[test]
fn short_source_removes_partial_artifacts() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("shrinks.bin");
    fs::write(&src, vec![1u8; 3 * 4096]).unwrap();
    let store = ArtifactStore::new(td.path().join("chunks"));
    let chunker = Chunker::new(4096, ChunkIdAllocator::new(1), store.clone()).unwrap();

    let fc = chunker.calculate(&src).unwrap();
    fs::write(&src, vec![1u8; 4096 + 100]).unwrap();

    let err = chunker.generate_chunks(&fc).unwrap_err();
    match &err {
        Error::Io { path, source } => {
            assert_eq!(path, &src);
            assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!store.path_for(2).exists());
    assert!(!store.path_for(3).exists());
}

#[test]
fn reset_rewinds_between_runs() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    fs::write(&src, vec![0u8; 5000]).unwrap();
    let mut chunker = Chunker::new(4096, ChunkIdAllocator::new(1), ArtifactStore::new(td.path())).unwrap();
    assert_eq!(chunker.calculate(&src).unwrap().ids, vec![1, 2]);
    chunker.reset_ids();
    assert_eq!(chunker.calculate(&src).unwrap().ids, vec![1, 2]);
}

#[cfg(unix)]
#[test]
fn failed_create_leaves_existing_entry_alone() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    fs::write(&src, vec![5u8; 100]).unwrap();
    let store = ArtifactStore::new(td.path().join("chunks"));
    store.prepare().unwrap();
    // Dangling link into a directory that does not exist: creating through it fails.
    std::os::unix::fs::symlink(td.path().join("missing/dir/target"), store.path_for(1)).unwrap();

    let chunker = Chunker::new(4096, ChunkIdAllocator::new(1), store.clone()).unwrap();
    let fc = chunker.calculate(&src).unwrap();
    let err = chunker.generate_chunks(&fc).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "got {err:?}");
    assert!(fs::symlink_metadata(store.path_for(1)).unwrap().file_type().is_symlink());
}

#[test]
fn exhausted_id_space_is_a_config_error() {
    let td = tempfile::tempdir().unwrap();
    let src = td.path().join("a.bin");
    fs::write(&src, vec![0u8; 3 * 4096]).unwrap();
    let chunker =
        Chunker::new(4096, ChunkIdAllocator::new(u64::MAX - 1), ArtifactStore::new(td.path().join("c"))).unwrap();

    let err = chunker.calculate(&src).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
    assert_eq!(chunker.ids().peek(), u64::MAX - 1);
}
