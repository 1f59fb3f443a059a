//! Filesystem collaborators.
//!
//! The interpreter never touches the filesystem directly; existence checks,
//! path resolution and file reads go through a [`Host`].  [`FsHost`] is the
//! real filesystem; [`MemoryHost`] keeps files in a map, for tests and for
//! embedders that serve scripts from somewhere else.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Filesystem queries used by the interpreter.
pub trait Host {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Make `path` absolute against the host's working directory (lexically).
    fn absolute(&self, path: &Path) -> PathBuf;

    /// Resolve symlinks; `None` if the path does not exist.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render a path with forward slashes, the way scripts spell them.
pub fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ── FsHost ────────────────────────────────────────────────────────────────────

/// [`Host`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsHost;

impl Host for FsHost {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return normalize(path);
        }
        let cwd = std::env::current_dir().unwrap_or_default();
        normalize(&cwd.join(path))
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

// ── MemoryHost ────────────────────────────────────────────────────────────────

/// In-memory [`Host`].  Adding a file also creates its parent directories.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    cwd: PathBuf,
    files: HashMap<PathBuf, String>,
    dirs: HashSet<PathBuf>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let mut dirs = HashSet::new();
        dirs.insert(PathBuf::from("/"));
        MemoryHost { cwd: PathBuf::from("/"), files: HashMap::new(), dirs }
    }

    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = normalize(cwd.as_ref());
        self.add_dir(self.cwd.clone());
        self
    }

    /// Builder form of [`MemoryHost::add_file`].
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.add_file(path, contents);
        self
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = self.absolute(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, contents.into());
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let mut cur = Some(self.absolute(path.as_ref()));
        while let Some(dir) = cur {
            cur = dir.parent().map(Path::to_path_buf);
            self.dirs.insert(dir);
        }
    }
}

impl Host for MemoryHost {
    fn exists(&self, path: &Path) -> bool {
        let p = self.absolute(path);
        self.files.contains_key(&p) || self.dirs.contains(&p)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(&self.absolute(path))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        }
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        let p = self.absolute(path);
        self.exists(&p).then_some(p)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(&self.absolute(path)).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file", path.display()))
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn memory_host_files_and_dirs() {
        let host = MemoryHost::new()
            .with_cwd("/work")
            .with_file("/usr/include/zlib.h", "")
            .with_file("cfg/app.cmake", "set(X 1)");
        assert!(host.exists(Path::new("/usr/include/zlib.h")));
        assert!(host.is_dir(Path::new("/usr/include")));
        assert!(host.is_dir(Path::new("/usr")));
        assert!(!host.is_dir(Path::new("/usr/include/zlib.h")));
        assert_eq!(
            host.read_to_string(Path::new("/work/cfg/app.cmake")).unwrap(),
            "set(X 1)"
        );
        assert!(host.read_to_string(Path::new("/missing")).is_err());
        assert_eq!(host.absolute(Path::new("sub/../y")), PathBuf::from("/work/y"));
    }

    #[test]
    fn fs_host_reads_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("CMakeLists.txt");
        std::fs::write(&file, "project(Demo)").unwrap();
        let host = FsHost;
        assert!(host.exists(&file));
        assert!(host.is_dir(dir.path()));
        assert_eq!(host.read_to_string(&file).unwrap(), "project(Demo)");
        assert!(host.canonicalize(&dir.path().join("nope")).is_none());
    }
}
