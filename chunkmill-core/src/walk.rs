//! Regular-file enumeration under a root directory.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// An input tree, optionally with one subtree left out of every walk.
#[derive(Clone, Debug)]
pub struct Tree {
    root: PathBuf,
    skip: Option<PathBuf>,
}

impl Tree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), skip: None }
    }

    /// Leaves `dir` out of every walk when it lies inside the root.
    ///
    /// Both paths are resolved, so `dir` may be spelled relative to the
    /// working directory. A `dir` that does not exist yet is ignored.
    pub fn excluding(mut self, dir: &Path) -> Self {
        let (Ok(root), Ok(dir)) = (fs::canonicalize(&self.root), fs::canonicalize(dir)) else {
            return self;
        };
        if let Ok(rel) = dir.strip_prefix(&root) {
            // Spelled the way walkdir reports entries below `self.root`.
            self.skip = Some(self.root.join(rel));
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterator over every regular file, in file-name order.
    ///
    /// Directories and symlinks are skipped. Walk failures are yielded as
    /// [`Error::Scan`] and do not end the iteration by themselves.
    pub fn regular_files(&self) -> RegularFiles {
        let skip = self.skip.clone();
        let inner = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(Box::new(move |ent: &walkdir::DirEntry| {
                skip.as_deref().map_or(true, |s| ent.path() != s)
            }) as EntryFilter);
        RegularFiles { root: self.root.clone(), inner }
    }

    /// Paths of every regular file.
    pub fn file_paths(&self) -> impl Iterator<Item = Result<PathBuf>> + Send {
        self.regular_files().map(|ent| ent.map(walkdir::DirEntry::into_path))
    }

    /// Counts regular files, failing on the first walk error.
    pub fn count_files(&self) -> Result<u64> {
        let mut n = 0u64;
        for ent in self.regular_files() {
            ent?;
            n += 1;
        }
        Ok(n)
    }

    /// Sizes of every regular file.
    pub fn file_sizes(&self) -> Result<Vec<u64>> {
        let mut sizes = Vec::new();
        for ent in self.regular_files() {
            let ent = ent?;
            let md = ent.metadata().map_err(|e| Error::walk(&self.root, e))?;
            sizes.push(md.len());
        }
        Ok(sizes)
    }
}

type EntryFilter = Box<dyn FnMut(&walkdir::DirEntry) -> bool + Send>;

pub struct RegularFiles {
    root: PathBuf,
    inner: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
}

impl Iterator for RegularFiles {
    type Item = Result<walkdir::DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(ent) if ent.file_type().is_file() => return Some(Ok(ent)),
                Ok(_) => continue,
                Err(e) => return Some(Err(Error::walk(&self.root, e))),
            }
        }
    }
}

/// `rel` with `/` separators regardless of platform.
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of `path` relative to `root`, `/`-separated.
pub fn relative_slash_path(path: &Path, root: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| {
        path.file_name().map(PathBuf::from).unwrap_or_else(|| path.to_path_buf())
    });
    slash_path(&rel)
}
