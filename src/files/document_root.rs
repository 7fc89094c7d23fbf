//! Mapping request paths onto the served directory.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Where a request path lands relative to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The normalized path leaves the document root
    Outside,
    /// Nothing exists at the path
    Missing,
    /// The path names a directory
    Directory(PathBuf),
    /// The path names something that is not a directory
    File(PathBuf),
}

/// The directory bounding every servable path.
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    /// Canonicalizes `root`; fails if it does not exist or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document root {} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Joins `request_path` under the root without touching the filesystem
    /// and checks the lexically normalized result stays inside the root.
    pub fn contain(&self, request_path: &str) -> Option<PathBuf> {
        // A leading slash must not make the joined path absolute
        let joined = self.root.join(request_path.trim_start_matches('/'));
        let normalized = normalize(&joined);

        if normalized.starts_with(normalize(&self.root)) {
            Some(normalized)
        } else {
            None
        }
    }

    pub fn resolve(&self, request_path: &str) -> Resolution {
        let Some(path) = self.contain(request_path) else {
            return Resolution::Outside;
        };

        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Resolution::Directory(path),
            Ok(_) => Resolution::File(path),
            Err(_) => Resolution::Missing,
        }
    }
}

/// Removes `.` components and folds `..` into its parent. A `..` that would
/// climb above a filesystem root is dropped; one that would climb above the
/// start of a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}
