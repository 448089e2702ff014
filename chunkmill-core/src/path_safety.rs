use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Turns a manifest `File` value (either separator) into a native relative path.
pub fn manifest_rel_path(file: &str) -> PathBuf {
    file.split(['\\', '/']).filter(|s| !s.is_empty()).collect()
}

/// Ensure `rel` is safe to create under `root`: relative, no `..`, and no
/// existing symlink anywhere between `root` and the target.
pub fn validate_path(root: &Path, rel: &Path) -> Result<PathBuf> {
    if rel.as_os_str().is_empty() {
        return Err(Error::UnsafePath("empty path".into()));
    }
    for comp in rel.components() {
        match comp {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::UnsafePath(format!("parent traversal not allowed: {rel:?}")))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafePath(format!("absolute paths are not allowed: {rel:?}")))
            }
        }
    }
    let mut cur = root.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(m) = std::fs::symlink_metadata(&cur) {
            if m.file_type().is_symlink() {
                return Err(Error::UnsafePath(format!("symlink in path (not following): {cur:?}")));
            }
        }
    }
    Ok(cur)
}
