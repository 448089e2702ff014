use chunkmill_core::walk::{relative_slash_path, slash_path, Tree};
use chunkmill_core::Error;
use std::fs;
use std::path::Path;

fn tree_with_chunks(root: &Path) {
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::create_dir_all(root.join("chunks")).unwrap();
    fs::write(root.join("top.bin"), b"12345").unwrap();
    fs::write(root.join("a/one"), b"1").unwrap();
    fs::write(root.join("a/b/two"), b"22").unwrap();
    fs::write(root.join("chunks/1.chunk"), b"zzz").unwrap();
}

fn rel_paths(tree: &Tree) -> Vec<String> {
    tree.file_paths().map(|p| relative_slash_path(&p.unwrap(), tree.root())).collect()
}

#[test]
fn lists_regular_files_in_name_order() {
    let td = tempfile::tempdir().unwrap();
    tree_with_chunks(td.path());
    let tree = Tree::new(td.path());
    assert_eq!(rel_paths(&tree), ["a/b/two", "a/one", "chunks/1.chunk", "top.bin"]);
    assert_eq!(tree.count_files().unwrap(), 4);
}

#[test]
fn excluded_subtree_is_left_out_of_every_walk() {
    let td = tempfile::tempdir().unwrap();
    tree_with_chunks(td.path());
    let tree = Tree::new(td.path()).excluding(&td.path().join("chunks"));
    assert_eq!(rel_paths(&tree), ["a/b/two", "a/one", "top.bin"]);
    assert_eq!(tree.count_files().unwrap(), 3);
    let mut sizes = tree.file_sizes().unwrap();
    sizes.sort();
    assert_eq!(sizes, [1, 2, 5]);
}

#[test]
fn exclusion_outside_the_root_or_missing_is_ignored() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path().join("data");
    tree_with_chunks(&root);
    fs::create_dir_all(td.path().join("elsewhere")).unwrap();

    let outside = Tree::new(&root).excluding(&td.path().join("elsewhere"));
    assert_eq!(outside.count_files().unwrap(), 4);
    let missing = Tree::new(&root).excluding(&root.join("not-yet"));
    assert_eq!(missing.count_files().unwrap(), 4);
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join("real"), b"x").unwrap();
    std::os::unix::fs::symlink(td.path().join("real"), td.path().join("link")).unwrap();
    assert_eq!(rel_paths(&Tree::new(td.path())), ["real"]);
}

#[test]
fn missing_root_is_a_scan_error() {
    let td = tempfile::tempdir().unwrap();
    let tree = Tree::new(td.path().join("absent"));
    assert!(matches!(tree.count_files(), Err(Error::Scan { .. })));
    assert!(matches!(tree.file_sizes(), Err(Error::Scan { .. })));
}

#[test]
fn slash_paths_ignore_platform_separator() {
    assert_eq!(slash_path(Path::new("a").join("b").join("c").as_path()), "a/b/c");
    assert_eq!(relative_slash_path(Path::new("/r/x/y.bin"), Path::new("/r")), "x/y.bin");
}
