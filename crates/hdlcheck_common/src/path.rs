//! Canonical filesystem paths with same-file equality semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// An absolute path usable as a database key.
///
/// Construction canonicalizes the path (resolving symlinks) when the file
/// exists, so two spellings of the same file compare equal and hash
/// identically. Paths that do not exist yet are normalized lexically
/// against the current directory instead.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonPath(PathBuf);

impl CanonPath {
    /// Builds a canonical path from any spelling.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match path.canonicalize() {
            Ok(canon) => Self(canon),
            Err(_) => Self(absolutize(path)),
        }
    }

    /// The underlying path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final path component, or the empty string for a bare root.
    pub fn basename(&self) -> &str {
        self.0
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Modification time of the file behind this path.
    pub fn mtime(&self) -> io::Result<SystemTime> {
        std::fs::metadata(&self.0)?.modified()
    }

    /// Whether this path currently exists on disk.
    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    /// Whether `other` refers to the same file on disk.
    ///
    /// Uses device+inode identity on unix when both files exist, falling
    /// back to path equality otherwise.
    pub fn same_file_as(&self, other: &Path) -> bool {
        same_file(&self.0, other)
    }
}

/// Compares two paths by filesystem identity (device+inode on unix),
/// falling back to canonical path equality when either does not exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(ma), Ok(mb)) = (std::fs::metadata(a), std::fs::metadata(b)) {
            return ma.dev() == mb.dev() && ma.ino() == mb.ino();
        }
    }
    CanonPath::new(a) == CanonPath::new(b)
}

fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };
    // Lexical cleanup of `.` and `..` components.
    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for CanonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Debug for CanonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonPath({})", self.0.display())
    }
}

impl AsRef<Path> for CanonPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<CanonPath> for PathBuf {
    fn from(p: CanonPath) -> PathBuf {
        p.0
    }
}
