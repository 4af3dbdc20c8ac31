//! Filesystem access for the static handler.
//!
//! [`FileReader`] maps a document-root relative path to file contents or
//! size. Failures are reported as a [`FileOutcome`] variant, never as an
//! error the caller has to downcast.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

#[derive(Debug)]
pub enum FileOutcome<T> {
    Found(T),
    NotFound,
    PermissionDenied,
    Failed(io::Error),
}

impl<T> FileOutcome<T> {
    fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => FileOutcome::NotFound,
            io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => {
                FileOutcome::PermissionDenied
            }
            _ => FileOutcome::Failed(err),
        }
    }
}

pub trait FileReader: Send + Sync + 'static {
    /// Reads the whole file at `path`.
    fn read(&self, path: &str) -> impl Future<Output = FileOutcome<Bytes>> + Send;

    /// Returns the size in bytes of the file at `path`.
    fn stat(&self, path: &str) -> impl Future<Output = FileOutcome<u64>> + Send;
}

/// Reads files below a document root on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    /// Canonicalizes `root`, which must exist and be a directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` to a regular file inside the root. Symlinks are
    /// followed; a target outside the root is denied.
    async fn resolve(&self, path: &str) -> FileOutcome<(PathBuf, u64)> {
        let resolved = match tokio::fs::canonicalize(self.root.join(path)).await {
            Ok(resolved) => resolved,
            Err(e) => return FileOutcome::from_io(e),
        };

        if !resolved.starts_with(&self.root) {
            tracing::warn!(path, resolved = %resolved.display(), "path resolves outside document root");
            return FileOutcome::PermissionDenied;
        }

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => FileOutcome::PermissionDenied,
            Ok(meta) => FileOutcome::Found((resolved, meta.len())),
            Err(e) => FileOutcome::from_io(e),
        }
    }
}

impl FileReader for FsReader {
    async fn read(&self, path: &str) -> FileOutcome<Bytes> {
        let resolved = match self.resolve(path).await {
            FileOutcome::Found((resolved, _)) => resolved,
            FileOutcome::NotFound => return FileOutcome::NotFound,
            FileOutcome::PermissionDenied => return FileOutcome::PermissionDenied,
            FileOutcome::Failed(e) => return FileOutcome::Failed(e),
        };

        match tokio::fs::read(&resolved).await {
            Ok(contents) => FileOutcome::Found(Bytes::from(contents)),
            Err(e) => FileOutcome::from_io(e),
        }
    }

    async fn stat(&self, path: &str) -> FileOutcome<u64> {
        match self.resolve(path).await {
            FileOutcome::Found((_, size)) => FileOutcome::Found(size),
            FileOutcome::NotFound => FileOutcome::NotFound,
            FileOutcome::PermissionDenied => FileOutcome::PermissionDenied,
            FileOutcome::Failed(e) => FileOutcome::Failed(e),
        }
    }
}
