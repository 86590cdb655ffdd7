//! Filesystem Facade (component A): the only part of the engine that
//! touches real storage. Modeled as a small capability trait with a
//! scheme-keyed registry, the same shape `jdx-hk` uses for protocol-like
//! pluggable backends (spec Design Note "Filesystem polymorphism").

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub mod_time_ms: i64,
}

/// A storage backend keyed by scheme prefix (`file:`, ...).
pub trait Backend: Send + Sync {
    fn scheme(&self) -> &'static str;
    fn data_in(&self, path: &str) -> bool;
    fn newest_in(&self, path: &str) -> Option<FileInfo>;
    fn oldest_in(&self, path: &str) -> Option<FileInfo>;
    fn rm(&self, path: &str) -> Result<()>;
    fn mv(&self, src: &str, dst: &str) -> Result<()>;
    /// Absolute form of `path` (scheme stripped), used by
    /// `Filesystem::normalized_path` to make paths independent of the
    /// process's actual CWD (spec §5 "CWD scoping").
    fn absolute(&self, path: &str) -> String;
    /// The directory external processes should be launched in to see
    /// this backend's paths resolve the same way the engine does.
    fn base_dir(&self) -> Option<&Path>;
}

/// Local disk backend, scoped to a base directory (spec §5, "CWD
/// scoping" — all workflow-relative I/O is routed through here instead
/// of mutating the process CWD).
#[derive(Debug, Clone)]
pub struct LocalBackend {
    base_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    fn mtime_ms(meta: &std::fs::Metadata) -> i64 {
        meta.modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn scan(&self, path: &str, newest: bool) -> Option<FileInfo> {
        let full = self.resolve(path);
        if full.is_file() {
            let meta = std::fs::metadata(&full).ok()?;
            return Some(FileInfo {
                path: path.to_string(),
                mod_time_ms: Self::mtime_ms(&meta),
            });
        }
        if !full.is_dir() {
            return None;
        }
        let mut best: Option<(PathBuf, i64)> = None;
        for entry in WalkDir::new(&full).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let t = Self::mtime_ms(&meta);
            best = match best {
                None => Some((entry.path().to_path_buf(), t)),
                Some((_, best_t)) if (newest && t > best_t) || (!newest && t < best_t) => {
                    Some((entry.path().to_path_buf(), t))
                }
                other => other,
            };
        }
        best.map(|(p, t)| FileInfo {
            path: p.to_string_lossy().to_string(),
            mod_time_ms: t,
        })
    }
}

impl Backend for LocalBackend {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn data_in(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn newest_in(&self, path: &str) -> Option<FileInfo> {
        self.scan(path, true)
    }

    fn oldest_in(&self, path: &str) -> Option<FileInfo> {
        self.scan(path, false)
    }

    fn rm(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        if !full.exists() {
            return Ok(());
        }
        if full.is_dir() {
            std::fs::remove_dir_all(full)?;
        } else {
            std::fs::remove_file(full)?;
        }
        Ok(())
    }

    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        let src_full = self.resolve(src);
        let dst_full = self.resolve(dst);
        if let Some(parent) = dst_full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(src_full, dst_full)?;
        Ok(())
    }

    fn absolute(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().into_owned()
    }

    fn base_dir(&self) -> Option<&Path> {
        Some(self.base_dir.as_path())
    }
}

/// The scheme prefix of a normalized path (`file`, ...), defaulting to
/// `file` for bare paths.
pub fn path_fs(path: &str) -> &str {
    match path.split_once(':') {
        Some((scheme, _)) if !scheme.is_empty() => scheme,
        _ => "file",
    }
}

pub fn path_filename(path: &str) -> &str {
    match path.split_once(':') {
        Some((_, rest)) => rest,
        None => path,
    }
}

/// Uniform view over one or more backends, keyed by scheme (spec §4.A).
pub struct Filesystem {
    backends: Vec<Box<dyn Backend>>,
}

impl Filesystem {
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    pub fn local(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(vec![Box::new(LocalBackend::new(base_dir))])
    }

    pub fn get_fs(&self, path: &str) -> Result<&dyn Backend> {
        let scheme = path_fs(path);
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .find(|b| b.scheme() == scheme)
            .ok_or_else(|| Error::UnknownProtocol(format!("filesystem scheme '{scheme}'")))
    }

    /// Canonical, absolute, scheme-prefixed form of `path` (spec §4.A),
    /// resolved against the owning backend's base directory so it no
    /// longer depends on the process's actual CWD.
    pub fn normalized_path(&self, path: &str) -> String {
        let scheme = path_fs(path);
        match self.get_fs(path) {
            Ok(backend) => format!("{scheme}:{}", backend.absolute(path_filename(path))),
            Err(_) => path.to_string(),
        }
    }

    /// Strip the `file:` scheme for display / passing to external commands;
    /// other schemes are left alone.
    pub fn display_path(&self, path: &str) -> String {
        let normalized = self.normalized_path(path);
        match normalized.split_once(':') {
            Some(("file", rest)) => rest.to_string(),
            _ => normalized,
        }
    }

    /// The directory to launch external processes in so their CWD
    /// matches the backend that produced `path` (spec §5).
    pub fn base_dir_for(&self, path: &str) -> Option<&Path> {
        self.get_fs(path).ok().and_then(|b| b.base_dir())
    }

    /// The default (`file`) backend's base directory — the workflow
    /// directory the whole run is scoped to.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir_for("")
    }

    pub fn data_in(&self, path: &str) -> bool {
        match self.get_fs(path) {
            Ok(backend) => backend.data_in(path_filename(path)),
            Err(_) => false,
        }
    }

    pub fn newest_in(&self, path: &str) -> Option<FileInfo> {
        self.get_fs(path).ok()?.newest_in(path_filename(path))
    }

    pub fn oldest_in(&self, path: &str) -> Option<FileInfo> {
        self.get_fs(path).ok()?.oldest_in(path_filename(path))
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
