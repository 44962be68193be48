//! Boundary providers for the image cache
//!
//! The cache never touches the filesystem or the network directly. It goes
//! through [`FileStore`] and [`Downloader`] so that tests can swap in
//! in-memory implementations and hosts can plug in their own platform APIs.

use crate::error::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod fs;
pub mod http;

pub use fs::TokioFileStore;
pub use http::{HttpDownloader, HttpDownloaderConfig};

/// Suffix of a body that is still being transferred
pub const PARTIAL_SUFFIX: &str = ".part";

/// Sibling path a transfer writes to before it is moved onto `destination`
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// True for names produced by [`partial_path`]
pub fn is_partial_name(name: &str) -> bool {
    name.ends_with(PARTIAL_SUFFIX)
}

/// Metadata for an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size_bytes: u64,
    pub modified_at: SystemTime,
}

/// File-metadata provider used by the cache
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stat a file
    ///
    /// Returns `Ok(None)` when nothing exists at `path`.
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>>;

    /// List the file names directly inside `dir`
    async fn list_dir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Delete a single file
    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Delete a directory and everything below it
    ///
    /// A missing directory is not an error.
    async fn remove_dir_all(&self, dir: &Path) -> Result<()>;

    /// Create a directory and its parents (idempotent)
    async fn create_dir_all(&self, dir: &Path) -> Result<()>;

    /// Replace the contents of `path` with `bytes`
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Read the whole file
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Outcome of a completed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStatus {
    pub status_code: u16,
}

impl TransferStatus {
    pub fn new(status_code: u16) -> Self {
        Self { status_code }
    }

    /// 2xx responses are the only ones that count as stored
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status_code)
    }
}

/// Byte-transfer provider used by the cache
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into `destination`
    ///
    /// The body is staged at [`partial_path`] and `destination` only appears
    /// once it is complete. A response that arrives with a non-success status
    /// is reported as `Ok(status)`; only transport failures are errors.
    async fn download(&self, url: &str, destination: &Path) -> Result<TransferStatus>;
}
