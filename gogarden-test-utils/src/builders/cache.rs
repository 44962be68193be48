//! Cache manager wired to in-memory providers

use crate::mocks::{MockDownloader, MockFileStore};
use gogarden_core::{CachePolicy, ImageCacheManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Cache directory used by [`CacheFixture`]
pub const FIXTURE_CACHE_DIR: &str = "/cache/plant-images";

/// An [`ImageCacheManager`] over a [`MockFileStore`] and a [`MockDownloader`]
///
/// The preload throttle is shortened to keep tests fast.
pub struct CacheFixture {
    pub manager: ImageCacheManager,
    pub store: Arc<MockFileStore>,
    pub downloader: Arc<MockDownloader>,
}

impl CacheFixture {
    pub fn new() -> Self {
        Self::with_policy(CachePolicy::default().with_preload_throttle(Duration::from_millis(1)))
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        let store = Arc::new(MockFileStore::new());
        let downloader = Arc::new(MockDownloader::new(store.clone()));
        let manager =
            ImageCacheManager::new(FIXTURE_CACHE_DIR, policy, store.clone(), downloader.clone())
                .expect("fixture policy must be valid");
        Self {
            manager,
            store,
            downloader,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        Path::new(FIXTURE_CACHE_DIR)
    }

    /// Derived file path for `url`
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.manager.file_path(url)
    }

    /// Put `url` in the cache as if it had been downloaded `age` ago
    pub fn seed(&self, url: &str, content: &[u8], age: Duration) -> PathBuf {
        let path = self.path_for(url);
        self.store.add_file_with_age(&path, content, age);
        path
    }
}

impl Default for CacheFixture {
    fn default() -> Self {
        Self::new()
    }
}
