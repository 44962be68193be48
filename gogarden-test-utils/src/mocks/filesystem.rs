//! In-memory file store for testing

use async_trait::async_trait;
use gogarden_core::error::IoError;
use gogarden_core::{Error, FileStat, FileStore, Result};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Mock [`FileStore`] backed by a map of paths to bytes
///
/// Modification times can be set explicitly, individual paths can be made
/// to fail, and every successful deletion is logged in order.
///
/// # Examples
///
/// ```rust,no_run
/// use gogarden_test_utils::MockFileStore;
/// use std::time::Duration;
///
/// let store = MockFileStore::new();
/// store.add_file_with_age("/cache/old.jpg", &[0u8; 500], Duration::from_secs(3600));
/// assert_eq!(store.file_count(), 1);
/// ```
#[derive(Default)]
pub struct MockFileStore {
    state: Mutex<MockFsState>,
}

#[derive(Default)]
struct MockFsState {
    files: HashMap<PathBuf, MockFile>,
    directories: HashSet<PathBuf>,
    deleted: Vec<PathBuf>,
    failing_stats: HashSet<PathBuf>,
    failing_removes: HashSet<PathBuf>,
    fail_listing: bool,
    fail_writes: bool,
}

#[derive(Debug, Clone)]
struct MockFile {
    content: Vec<u8>,
    modified_at: SystemTime,
}

fn mock_failure(kind: ErrorKind, path: &Path) -> Error {
    IoError::from_std(std::io::Error::new(kind, "mock failure"))
        .with_path(path)
        .into()
}

fn not_found(path: &Path) -> Error {
    IoError::file_not_found(path).into()
}

impl MockFsState {
    fn add_directory(&mut self, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.directories.insert(ancestor.to_path_buf());
        }
    }

    fn directory_exists(&self, dir: &Path) -> bool {
        self.directories.contains(dir)
    }
}

impl MockFileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file modified just now, creating its parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, content: &[u8]) {
        self.add_file_modified_at(path, content, SystemTime::now());
    }

    /// Add a file whose modification time lies `age` in the past
    pub fn add_file_with_age(&self, path: impl AsRef<Path>, content: &[u8], age: Duration) {
        self.add_file_modified_at(path, content, SystemTime::now() - age);
    }

    /// Add a file with an explicit modification time
    pub fn add_file_modified_at(
        &self,
        path: impl AsRef<Path>,
        content: &[u8],
        modified_at: SystemTime,
    ) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            state.add_directory(parent);
        }
        state.files.insert(
            path.to_path_buf(),
            MockFile {
                content: content.to_vec(),
                modified_at,
            },
        );
    }

    /// Change the modification time of an existing file
    pub fn set_modified(&self, path: impl AsRef<Path>, modified_at: SystemTime) {
        let mut state = self.state.lock().unwrap();
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.modified_at = modified_at;
        }
    }

    /// Move a file onto `to`, replacing whatever was there
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let file = state
            .files
            .remove(from.as_ref())
            .ok_or_else(|| not_found(from.as_ref()))?;
        state.files.insert(to.as_ref().to_path_buf(), file);
        Ok(())
    }

    /// Create a directory without any files
    pub fn create_directory(&self, dir: impl AsRef<Path>) {
        self.state.lock().unwrap().add_directory(dir.as_ref());
    }

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().unwrap().files.contains_key(path.as_ref())
    }

    pub fn directory_exists(&self, dir: impl AsRef<Path>) -> bool {
        self.state.lock().unwrap().directory_exists(dir.as_ref())
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    /// Contents of a file, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path.as_ref())
            .map(|file| file.content.clone())
    }

    /// Files removed through [`FileStore::remove_file`], in order
    pub fn deleted(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// Make `stat` fail for one path
    pub fn fail_stat_for(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .failing_stats
            .insert(path.as_ref().to_path_buf());
    }

    /// Make `remove_file` fail for one path
    pub fn fail_remove_for(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .failing_removes
            .insert(path.as_ref().to_path_buf());
    }

    /// Make every `list_dir` call fail
    pub fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    /// Make every `write` and `create_dir_all` call fail as if the disk were full
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Remove all files, directories and failure settings
    pub fn reset(&self) {
        *self.state.lock().unwrap() = MockFsState::default();
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>> {
        let state = self.state.lock().unwrap();
        if state.failing_stats.contains(path) {
            return Err(mock_failure(ErrorKind::PermissionDenied, path));
        }
        Ok(state.files.get(path).map(|file| FileStat {
            size_bytes: file.content.len() as u64,
            modified_at: file.modified_at,
        }))
    }

    async fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(mock_failure(ErrorKind::PermissionDenied, dir));
        }
        if !state.directory_exists(dir) {
            return Err(not_found(dir));
        }

        let mut names: Vec<String> = state
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_removes.contains(path) {
            return Err(mock_failure(ErrorKind::PermissionDenied, path));
        }
        match state.files.remove(path) {
            Some(_) => {
                state.deleted.push(path.to_path_buf());
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    async fn remove_dir_all(&self, dir: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.files.retain(|path, _| !path.starts_with(dir));
        state.directories.retain(|path| !path.starts_with(dir));
        Ok(())
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(mock_failure(ErrorKind::StorageFull, dir));
        }
        state.add_directory(dir);
        Ok(())
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(mock_failure(ErrorKind::StorageFull, path));
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !state.directory_exists(parent)
        {
            return Err(not_found(parent));
        }
        state.files.insert(
            path.to_path_buf(),
            MockFile {
                content: bytes.to_vec(),
                modified_at: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| not_found(path))
    }
}
