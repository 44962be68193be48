//! Fetch-and-store engine
//!
//! Every transfer runs on its own task and is published in an in-flight map
//! as a [`Shared`] future. Concurrent callers for the same URL attach to that
//! future instead of starting a second download, and a caller that goes away
//! does not cancel the transfer.

use super::freshness::FreshnessChecker;
use super::index::MemoryIndex;
use crate::error::{Error, InternalError, TransferError};
use crate::providers::{Downloader, FileStore};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

type InFlight = Shared<BoxFuture<'static, Option<PathBuf>>>;

/// Downloads images into the cache directory, once per URL at a time
#[derive(Clone)]
pub struct FetchEngine {
    inner: Arc<FetchInner>,
}

struct FetchInner {
    store: Arc<dyn FileStore>,
    downloader: Arc<dyn Downloader>,
    freshness: FreshnessChecker,
    index: Arc<MemoryIndex>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl FetchEngine {
    pub fn new(
        store: Arc<dyn FileStore>,
        downloader: Arc<dyn Downloader>,
        freshness: FreshnessChecker,
        index: Arc<MemoryIndex>,
    ) -> Self {
        Self {
            inner: Arc::new(FetchInner {
                store,
                downloader,
                freshness,
                index,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Make sure `url` is on disk and return its path
    ///
    /// Serves a fresh cached file without touching the network. Returns
    /// `None` on any failure; failures are logged, never retried.
    pub async fn cache_image(&self, url: &str) -> Option<PathBuf> {
        if url.trim().is_empty() {
            return None;
        }

        let transfer = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(url) {
                Some(existing) => {
                    debug!("Joining in-flight download of {url}");
                    existing.clone()
                }
                None => {
                    let transfer = self.spawn_transfer(url);
                    in_flight.insert(url.to_string(), transfer.clone());
                    transfer
                }
            }
        };

        let result = transfer.clone().await;

        // The task clears its own entry; this only matters if it panicked
        let mut in_flight = self.inner.in_flight.lock().await;
        if in_flight
            .get(url)
            .is_some_and(|current| current.ptr_eq(&transfer))
        {
            in_flight.remove(url);
        }

        result
    }

    /// Number of transfers currently running
    pub async fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().await.len()
    }

    fn spawn_transfer(&self, url: &str) -> InFlight {
        let engine = self.clone();
        let owned = url.to_string();
        let handle = tokio::spawn(async move {
            let result = engine.fetch_and_store(&owned).await;
            engine.inner.in_flight.lock().await.remove(&owned);
            result
        });

        let url = url.to_string();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Download task for {url} failed: {}", InternalError::from(e));
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn fetch_and_store(&self, url: &str) -> Option<PathBuf> {
        let inner = &self.inner;

        if let Some(path) = inner.freshness.is_cached(url).await {
            inner.index.insert(url, path.clone()).await;
            return Some(path);
        }

        let dir = inner.freshness.paths().dir();
        if let Err(e) = inner.store.create_dir_all(dir).await {
            warn!("Failed to create cache directory {}: {e}", dir.display());
            return None;
        }

        let path = inner.freshness.paths().file_path(url);
        info!("Downloading {url}");

        match inner.downloader.download(url, &path).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => {
                let error = TransferError::http_status(url, status.status_code);
                log_transfer_failure(url, &error.into());
                inner.index.remove(url).await;
                return None;
            }
            Err(e) => {
                log_transfer_failure(url, &e);
                inner.index.remove(url).await;
                return None;
            }
        }

        match inner.store.stat(&path).await {
            Ok(Some(stat)) => {
                debug!("Stored {url} at {} ({} bytes)", path.display(), stat.size_bytes);
                inner.index.insert(url, path.clone()).await;
                Some(path)
            }
            Ok(None) => {
                warn!(
                    "Download of {url} succeeded but {} does not exist",
                    path.display()
                );
                inner.index.remove(url).await;
                None
            }
            Err(e) => {
                warn!("Failed to verify {}: {e}", path.display());
                inner.index.remove(url).await;
                None
            }
        }
    }
}

/// Nothing is remembered about a failure, so the next request retries it
fn log_transfer_failure(url: &str, error: &Error) {
    if error.is_transient() {
        info!("Download of {url} failed, will retry on next request: {error}");
    } else {
        warn!("Failed to download {url}: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::image_cache::key::CachePaths;
    use crate::image_cache::policy::CachePolicy;
    use crate::providers::{TokioFileStore, TransferStatus};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingDownloader {
        status: u16,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl CountingDownloader {
        fn new(status: u16, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                status,
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Downloader for CountingDownloader {
        async fn download(&self, _url: &str, destination: &Path) -> Result<TransferStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if (200..300).contains(&self.status) {
                tokio::fs::write(destination, b"image-bytes").await?;
            }
            Ok(TransferStatus::new(self.status))
        }
    }

    fn engine(
        dir: &TempDir,
        downloader: Arc<CountingDownloader>,
    ) -> (FetchEngine, Arc<MemoryIndex>) {
        let store: Arc<dyn FileStore> = Arc::new(TokioFileStore::new());
        let freshness = FreshnessChecker::new(
            store.clone(),
            CachePaths::new(dir.path().join("plant-images")),
            CachePolicy::default(),
        );
        let index = Arc::new(MemoryIndex::new());
        (
            FetchEngine::new(store, downloader, freshness, index.clone()),
            index,
        )
    }

    #[tokio::test]
    async fn test_cache_image_downloads_then_hits() {
        let dir = TempDir::new().unwrap();
        let downloader = CountingDownloader::new(200, Duration::ZERO);
        let (engine, index) = engine(&dir, downloader.clone());
        let url = "https://cdn.example.com/tomato.jpg";

        let first = engine.cache_image(url).await.unwrap();
        assert!(first.exists());
        assert_eq!(index.get(url).await, Some(first.clone()));

        let second = engine.cache_image(url).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(downloader.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_status_returns_none() {
        let dir = TempDir::new().unwrap();
        let downloader = CountingDownloader::new(404, Duration::ZERO);
        let (engine, index) = engine(&dir, downloader.clone());

        assert!(engine.cache_image("https://x.com/missing.jpg").await.is_none());
        assert!(index.is_empty().await);
        assert_eq!(engine.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_transfer() {
        let dir = TempDir::new().unwrap();
        let downloader = CountingDownloader::new(200, Duration::from_millis(50));
        let (engine, _) = engine(&dir, downloader.clone());
        let url = "https://cdn.example.com/basil.png";

        let results =
            futures::future::join_all((0..8).map(|_| engine.cache_image(url))).await;

        assert_eq!(downloader.calls(), 1);
        let first = results[0].clone().unwrap();
        assert!(results.iter().all(|r| r.as_ref() == Some(&first)));
        assert_eq!(engine.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_transfer() {
        let dir = TempDir::new().unwrap();
        let downloader = CountingDownloader::new(200, Duration::from_millis(30));
        let (engine, index) = engine(&dir, downloader.clone());
        let url = "https://cdn.example.com/mint.jpg";

        let timed_out =
            tokio::time::timeout(Duration::from_millis(5), engine.cache_image(url)).await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(index.contains(url).await);
        assert_eq!(downloader.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_url_is_ignored() {
        let dir = TempDir::new().unwrap();
        let downloader = CountingDownloader::new(200, Duration::ZERO);
        let (engine, _) = engine(&dir, downloader.clone());

        assert!(engine.cache_image("").await.is_none());
        assert_eq!(downloader.calls(), 0);
    }
}
