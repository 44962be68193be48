//! Background preload queue
//!
//! A single worker task drains the queue in FIFO order with a fixed pause
//! after each download. The worker exits when the queue runs dry and is
//! spawned again by the next enqueue.

use super::fetch::FetchEngine;
use super::freshness::FreshnessChecker;
use super::index::MemoryIndex;
use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    current: Option<String>,
    running: bool,
}

impl QueueState {
    fn contains(&self, url: &str) -> bool {
        self.current.as_deref() == Some(url) || self.pending.iter().any(|queued| queued == url)
    }
}

#[derive(Clone)]
pub struct PreloadQueue {
    inner: Arc<PreloadInner>,
}

struct PreloadInner {
    engine: FetchEngine,
    freshness: FreshnessChecker,
    index: Arc<MemoryIndex>,
    throttle: Duration,
    state: Mutex<QueueState>,
    idle: Notify,
}

/// Only plain web URLs are worth warming
pub(crate) fn is_preloadable(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && (url.starts_with("http://") || url.starts_with("https://"))
}

impl PreloadQueue {
    pub fn new(
        engine: FetchEngine,
        freshness: FreshnessChecker,
        index: Arc<MemoryIndex>,
        throttle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PreloadInner {
                engine,
                freshness,
                index,
                throttle,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue `url` for a background download
    ///
    /// Returns `false` when the URL is blank, already queued, or already
    /// resolvable from the cache.
    pub async fn queue_for_preload(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            return false;
        }
        if self.inner.index.contains(url).await || self.inner.state.lock().await.contains(url) {
            return false;
        }
        if let Some(path) = self.inner.freshness.is_cached(url).await {
            self.inner.index.insert(url, path).await;
            return false;
        }
        self.enqueue(url).await
    }

    /// Queue every preloadable URL in `urls`, returning how many were added
    pub async fn preload_images<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queued = 0;
        for url in urls {
            let url = url.as_ref();
            if is_preloadable(url) && self.queue_for_preload(url).await {
                queued += 1;
            }
        }
        queued
    }

    /// Append without freshness checks; the caller already knows it is a miss
    pub(crate) async fn enqueue(&self, url: &str) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.contains(url) {
            return false;
        }
        state.pending.push_back(url.to_string());
        trace!("Queued {url} for preload ({} pending)", state.pending.len());

        if !state.running {
            state.running = true;
            let queue = self.clone();
            tokio::spawn(async move { queue.run_worker().await });
        }
        true
    }

    /// URLs waiting to be processed, not counting the one in progress
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.running
    }

    /// Resolve once the worker has drained the queue
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.inner.state.lock().await.running {
                return;
            }
            notified.await;
        }
    }

    async fn run_worker(self) {
        debug!("Preload worker started");
        let mut processed = 0usize;

        loop {
            let next = {
                let mut state = self.inner.state.lock().await;
                match state.pending.pop_front() {
                    Some(url) => {
                        state.current = Some(url.clone());
                        url
                    }
                    None => {
                        state.current = None;
                        state.running = false;
                        self.inner.idle.notify_waiters();
                        break;
                    }
                }
            };

            if self.inner.engine.cache_image(&next).await.is_none() {
                debug!("Preload of {next} did not produce a cached file");
            }
            processed += 1;

            tokio::time::sleep(self.inner.throttle).await;
        }

        debug!("Preload worker finished after {processed} item(s)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::image_cache::key::CachePaths;
    use crate::image_cache::policy::CachePolicy;
    use crate::providers::{Downloader, FileStore, TokioFileStore, TransferStatus};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    /// Records the order of downloads and fails URLs containing "fail"
    #[derive(Default)]
    struct RecordingDownloader {
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Downloader for RecordingDownloader {
        async fn download(&self, url: &str, destination: &Path) -> Result<TransferStatus> {
            self.seen.lock().unwrap().push(url.to_string());
            tokio::time::sleep(Duration::from_millis(10)).await;
            if url.contains("fail") {
                return Ok(TransferStatus::new(500));
            }
            tokio::fs::write(destination, url.as_bytes()).await?;
            Ok(TransferStatus::new(200))
        }
    }

    fn queue(
        dir: &TempDir,
        downloader: Arc<RecordingDownloader>,
    ) -> (PreloadQueue, Arc<MemoryIndex>) {
        let store: Arc<dyn FileStore> = Arc::new(TokioFileStore::new());
        let freshness = FreshnessChecker::new(
            store.clone(),
            CachePaths::new(dir.path()),
            CachePolicy::default(),
        );
        let index = Arc::new(MemoryIndex::new());
        let engine = FetchEngine::new(store, downloader, freshness.clone(), index.clone());
        (
            PreloadQueue::new(engine, freshness, index.clone(), Duration::from_millis(5)),
            index,
        )
    }

    #[tokio::test]
    async fn test_duplicate_enqueue_is_suppressed() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(RecordingDownloader::default());
        let (queue, _) = queue(&dir, downloader.clone());

        assert!(queue.queue_for_preload("https://x.com/a.jpg").await);
        assert!(!queue.queue_for_preload("https://x.com/a.jpg").await);

        queue.wait_until_idle().await;
        assert_eq!(downloader.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_drains_in_order_and_survives_failures() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(RecordingDownloader::default());
        let (queue, index) = queue(&dir, downloader.clone());

        let urls = [
            "https://x.com/1.jpg",
            "https://x.com/fail.jpg",
            "https://x.com/3.jpg",
        ];
        assert_eq!(queue.preload_images(urls).await, 3);

        queue.wait_until_idle().await;
        assert!(!queue.is_running().await);
        assert!(queue.is_empty().await);
        assert_eq!(*downloader.seen.lock().unwrap(), urls);
        assert!(index.contains("https://x.com/1.jpg").await);
        assert!(!index.contains("https://x.com/fail.jpg").await);
        assert!(index.contains("https://x.com/3.jpg").await);
    }

    #[tokio::test]
    async fn test_preload_images_filters_invalid_entries() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(RecordingDownloader::default());
        let (queue, _) = queue(&dir, downloader.clone());

        let queued = queue
            .preload_images(["", "   ", "ftp://x.com/a.jpg", "not a url", "https://x.com/ok.jpg"])
            .await;
        assert_eq!(queued, 1);
        queue.wait_until_idle().await;
    }

    #[tokio::test]
    async fn test_cached_url_is_not_queued() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(RecordingDownloader::default());
        let (queue, index) = queue(&dir, downloader.clone());
        let url = "https://x.com/warm.jpg";

        std::fs::write(CachePaths::new(dir.path()).file_path(url), b"warm").unwrap();

        assert!(!queue.queue_for_preload(url).await);
        assert!(index.contains(url).await);
        assert!(downloader.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worker_restarts_after_idle() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(RecordingDownloader::default());
        let (queue, _) = queue(&dir, downloader.clone());

        queue.queue_for_preload("https://x.com/one.jpg").await;
        queue.wait_until_idle().await;
        queue.queue_for_preload("https://x.com/two.jpg").await;
        queue.wait_until_idle().await;

        assert_eq!(downloader.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wait_until_idle_returns_immediately_when_idle() {
        let dir = TempDir::new().unwrap();
        let (queue, _) = queue(&dir, Arc::new(RecordingDownloader::default()));
        tokio::time::timeout(Duration::from_millis(100), queue.wait_until_idle())
            .await
            .unwrap();
    }
}
