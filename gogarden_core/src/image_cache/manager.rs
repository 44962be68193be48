//! Image cache manager
//!
//! [`ImageCacheManager`] is a cheaply cloneable handle. Construct it once at
//! startup and hand clones to whoever needs images; every clone shares the
//! same index, in-flight map and preload queue.

use super::cleanup::{CleanupReport, cleanup_old_files};
use super::fetch::FetchEngine;
use super::freshness::FreshnessChecker;
use super::index::MemoryIndex;
use super::key::CachePaths;
use super::policy::CachePolicy;
use super::preload::{PreloadQueue, is_preloadable};
use super::{CacheStats, ImageUri};
use crate::error::Result;
use crate::providers::{Downloader, FileStore, HttpDownloader, TokioFileStore, is_partial_name};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct ImageCacheManager {
    store: Arc<dyn FileStore>,
    paths: CachePaths,
    policy: CachePolicy,
    index: Arc<MemoryIndex>,
    freshness: FreshnessChecker,
    engine: FetchEngine,
    queue: PreloadQueue,
}

impl ImageCacheManager {
    /// Build a manager over explicit providers
    pub fn new(
        dir: impl Into<PathBuf>,
        policy: CachePolicy,
        store: Arc<dyn FileStore>,
        downloader: Arc<dyn Downloader>,
    ) -> Result<Self> {
        policy.validate()?;

        let paths = CachePaths::new(dir);
        let index = Arc::new(MemoryIndex::new());
        let freshness = FreshnessChecker::new(store.clone(), paths.clone(), policy);
        let engine = FetchEngine::new(store.clone(), downloader, freshness.clone(), index.clone());
        let queue = PreloadQueue::new(
            engine.clone(),
            freshness.clone(),
            index.clone(),
            policy.preload_throttle,
        );

        Ok(Self {
            store,
            paths,
            policy,
            index,
            freshness,
            engine,
            queue,
        })
    }

    /// Manager over the local filesystem and a default HTTP client
    pub fn with_defaults(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(
            dir,
            CachePolicy::default(),
            Arc::new(TokioFileStore::new()),
            Arc::new(HttpDownloader::new()?),
        )
    }

    pub fn cache_dir(&self) -> &Path {
        self.paths.dir()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Derived on-disk location for `url`, whether or not it exists
    pub fn file_path(&self, url: &str) -> PathBuf {
        self.paths.file_path(url)
    }

    /// Create the cache directory and run a cleanup pass
    pub async fn initialize(&self) -> CleanupReport {
        if let Err(e) = self.store.create_dir_all(self.paths.dir()).await {
            warn!(
                "Failed to create cache directory {}: {e}",
                self.paths.dir().display()
            );
            return CleanupReport::default();
        }
        self.cleanup_old_files().await
    }

    /// Best URI to display `url` with, right now
    ///
    /// Returns the local file when one is cached. Otherwise returns the
    /// input unchanged and, for http(s) URLs, queues a background download;
    /// this never waits on the network.
    pub async fn get_image_uri(&self, url: &str) -> Option<ImageUri> {
        if url.trim().is_empty() {
            return None;
        }

        if let Some(path) = self.index.get(url).await {
            match self.store.stat(&path).await {
                Ok(Some(_)) => return Some(ImageUri::Local(path)),
                Ok(None) => {
                    debug!("Indexed file for {url} is gone");
                    self.index.remove(url).await;
                }
                Err(e) => {
                    warn!("Failed to stat {}: {e}", path.display());
                    self.index.remove(url).await;
                }
            }
        }

        if let Some(path) = self.freshness.is_cached(url).await {
            self.index.insert(url, path.clone()).await;
            return Some(ImageUri::Local(path));
        }

        if is_preloadable(url) {
            self.queue.enqueue(url).await;
        }
        Some(ImageUri::Remote(url.to_string()))
    }

    pub async fn cache_image(&self, url: &str) -> Option<PathBuf> {
        self.engine.cache_image(url).await
    }

    pub async fn is_cached(&self, url: &str) -> Option<PathBuf> {
        self.freshness.is_cached(url).await
    }

    pub async fn queue_for_preload(&self, url: &str) -> bool {
        self.queue.queue_for_preload(url).await
    }

    pub async fn preload_images<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.queue.preload_images(urls).await
    }

    /// Wait for the preload worker to drain the queue
    pub async fn wait_for_preloads(&self) {
        self.queue.wait_until_idle().await;
    }

    pub async fn cleanup_old_files(&self) -> CleanupReport {
        cleanup_old_files(self.store.as_ref(), self.paths.dir(), &self.policy).await
    }

    /// Drop the cached file and index entry for one URL
    ///
    /// Returns `true` when a file was deleted.
    pub async fn invalidate(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            return false;
        }
        self.index.remove(url).await;

        let path = self.paths.file_path(url);
        match self.store.remove_file(&path).await {
            Ok(()) => {
                info!("Invalidated cached image for {url}");
                true
            }
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                warn!("Failed to delete {}: {e}", path.display());
                false
            }
        }
    }

    /// Delete the whole cache directory and start over empty
    pub async fn clear_cache(&self) -> bool {
        let dir = self.paths.dir();
        let cleared = async {
            self.store.remove_dir_all(dir).await?;
            self.store.create_dir_all(dir).await
        }
        .await;
        self.index.clear().await;

        match cleared {
            Ok(()) => {
                info!("Cleared image cache at {}", dir.display());
                true
            }
            Err(e) => {
                warn!("Failed to clear image cache at {}: {e}", dir.display());
                false
            }
        }
    }

    /// Snapshot of disk usage and in-process state
    ///
    /// A directory that cannot be listed reports zero files.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            memory_cache_count: self.index.len().await,
            queue_length: self.queue.len().await,
            ..CacheStats::default()
        };

        let dir = self.paths.dir();
        let names = match self.store.list_dir(dir).await {
            Ok(names) => names,
            Err(e) => {
                if !e.is_not_found() {
                    warn!("Failed to list cache directory {}: {e}", dir.display());
                }
                return stats;
            }
        };

        for name in names.into_iter().filter(|name| !is_partial_name(name)) {
            match self.store.stat(&dir.join(&name)).await {
                Ok(Some(stat)) => {
                    stats.file_count += 1;
                    stats.total_size_bytes += stat.size_bytes;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to stat {name}: {e}"),
            }
        }
        stats
    }
}

impl std::fmt::Debug for ImageCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCacheManager")
            .field("dir", &self.paths.dir())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
