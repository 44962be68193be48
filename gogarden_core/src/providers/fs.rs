//! Real filesystem store backed by `tokio::fs`

use crate::error::{IoError, Result};
use crate::providers::{FileStat, FileStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

/// [`FileStore`] implementation over the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileStore;

impl TokioFileStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> crate::Error + '_ {
    move |e| IoError::from_std(e).with_path(path).into()
}

#[async_trait]
impl FileStore for TokioFileStore {
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>> {
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(FileStat {
                size_bytes: metadata.len(),
                modified_at: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(path)(e)),
        }
    }

    async fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let mut reader = fs::read_dir(dir).await.map_err(io_err(dir))?;
        let mut names = Vec::new();

        while let Some(entry) = reader.next_entry().await.map_err(io_err(dir))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file && let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(io_err(path))
    }

    async fn remove_dir_all(&self, dir: &Path) -> Result<()> {
        match fs::remove_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(dir)(e)),
        }
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await.map_err(io_err(dir))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).await.map_err(io_err(path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(io_err(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stat_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();

        let stat = store.stat(&dir.path().join("nope.jpg")).await.unwrap();
        assert!(stat.is_none());
    }

    #[tokio::test]
    async fn test_stat_directory_is_none() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();

        assert!(store.stat(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_stat_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();
        let path = dir.path().join("basil.png");

        store.write(&path, b"0123456789").await.unwrap();

        let stat = store.stat(&path).await.unwrap().unwrap();
        assert_eq!(stat.size_bytes, 10);
        assert!(stat.modified_at <= SystemTime::now());
        assert_eq!(store.read(&path).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_list_dir_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();
        store.write(&dir.path().join("b.jpg"), b"b").await.unwrap();
        store.write(&dir.path().join("a.jpg"), b"a").await.unwrap();
        store.create_dir_all(&dir.path().join("nested")).await.unwrap();

        let names = store.list_dir(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();

        let err = store.list_dir(&dir.path().join("gone")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_dir_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();
        let cache = dir.path().join("plant-images");

        store.create_dir_all(&cache).await.unwrap();
        store.write(&cache.join("x.jpg"), b"x").await.unwrap();

        store.remove_dir_all(&cache).await.unwrap();
        store.remove_dir_all(&cache).await.unwrap();
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let store = TokioFileStore::new();
        let path = dir.path().join("ghost.jpg");

        match store.remove_file(&path).await.unwrap_err() {
            crate::Error::Io(io) => {
                assert_eq!(io.kind, IoErrorKind::FileNotFound);
                assert_eq!(io.path, Some(path));
            }
            other => panic!("Expected Io error, got {other:?}"),
        }
    }
}
