//! Output-tree path abstraction for working and cooked trees
//!
//! The router talks to the filesystem only through this type: join by relative
//! component, idempotent directory creation, symbolic-link creation, and
//! existence/kind queries. The single raw file write in the crate (the cooked
//! byte copy) takes the rendered path from here.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What currently exists at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    None,
    File,
    Directory,
    Link,
}

/// A location inside a working or cooked output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    path: PathBuf,
}

impl ProjectPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Join a relative component.
    pub fn join(&self, component: impl AsRef<Path>) -> Self {
        Self {
            path: self.path.join(component),
        }
    }

    /// Create this directory (and parents). Idempotent.
    pub fn make_dir(&self) -> Result<()> {
        if self.kind() != PathKind::Directory {
            debug!(path = %self.path.display(), "creating directory");
            fs::create_dir_all(&self.path)?;
        }
        Ok(())
    }

    /// Create a symbolic link at this path pointing to `target`. Idempotent:
    /// an existing link (or file) is left alone.
    pub fn make_link_to(&self, target: &ProjectPath) -> Result<()> {
        if self.kind() != PathKind::None {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(link = %self.path.display(), target = %target.path.display(), "creating link");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target.path, &self.path)?;
        #[cfg(windows)]
        std::os::windows::fs::symlink_file(&target.path, &self.path)?;
        Ok(())
    }

    /// Kind query via symlink metadata so dangling links still report as links.
    pub fn kind(&self) -> PathKind {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) => {
                if meta.file_type().is_symlink() {
                    PathKind::Link
                } else if meta.is_dir() {
                    PathKind::Directory
                } else {
                    PathKind::File
                }
            }
            Err(_) => PathKind::None,
        }
    }

    /// Rendered path for native file-open calls.
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ProjectPath::new(tmp.path()).join("a").join("b");
        dir.make_dir().unwrap();
        dir.make_dir().unwrap();
        assert_eq!(dir.kind(), PathKind::Directory);
    }

    #[test]
    fn kind_distinguishes_files_and_links() {
        let tmp = tempfile::tempdir().unwrap();
        let root = ProjectPath::new(tmp.path());

        let file = root.join("data.bin");
        fs::write(file.as_path(), b"x").unwrap();
        assert_eq!(file.kind(), PathKind::File);

        let missing = root.join("missing");
        assert_eq!(missing.kind(), PathKind::None);

        #[cfg(unix)]
        {
            let link = root.join("link");
            link.make_link_to(&file).unwrap();
            assert_eq!(link.kind(), PathKind::Link);
            // Second call is a no-op, not an error
            link.make_link_to(&file).unwrap();
        }
    }
}
