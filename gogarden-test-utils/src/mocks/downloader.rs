//! Scriptable downloader for testing

use super::filesystem::MockFileStore;
use async_trait::async_trait;
use gogarden_core::error::TransferError;
use gogarden_core::providers::partial_path;
use gogarden_core::{Downloader, FileStore, Result, TransferStatus};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bytes served for URLs without an explicit response
pub const DEFAULT_BODY: &[u8] = b"mock image bytes";

/// Mock [`Downloader`] that writes into a [`MockFileStore`]
///
/// Responses are configured per URL; everything else gets `200` with
/// [`DEFAULT_BODY`]. Calls are counted per URL and the peak number of
/// concurrent transfers is tracked. Successful bodies are staged half-written
/// at the partial path for the configured delay before being moved into place.
pub struct MockDownloader {
    store: Arc<MockFileStore>,
    behavior: Arc<Mutex<MockBehavior>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Status { status: u16, body: Vec<u8> },
    TransportError(String),
}

#[derive(Debug)]
struct MockBehavior {
    responses: HashMap<String, MockResponse>,
    default_response: MockResponse,
    delay: Duration,
    calls: Vec<String>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: MockResponse::Status {
                status: 200,
                body: DEFAULT_BODY.to_vec(),
            },
            delay: Duration::ZERO,
            calls: Vec::new(),
        }
    }
}

impl MockDownloader {
    pub fn new(store: Arc<MockFileStore>) -> Self {
        Self {
            store,
            behavior: Arc::new(Mutex::new(MockBehavior::default())),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Serve `body` with a 200 for `url`
    pub fn respond_with(&self, url: &str, body: &[u8]) {
        self.respond_with_status(url, 200, body);
    }

    pub fn respond_with_status(&self, url: &str, status: u16, body: &[u8]) {
        self.behavior.lock().unwrap().responses.insert(
            url.to_string(),
            MockResponse::Status {
                status,
                body: body.to_vec(),
            },
        );
    }

    /// Answer `url` with a non-success status and no body
    pub fn fail_with_status(&self, url: &str, status: u16) {
        self.respond_with_status(url, status, &[]);
    }

    /// Make `url` fail before any response arrives
    pub fn fail_transport(&self, url: &str, message: &str) {
        self.behavior
            .lock()
            .unwrap()
            .responses
            .insert(url.to_string(), MockResponse::TransportError(message.to_string()));
    }

    /// Status used for URLs without an explicit response
    pub fn set_default_status(&self, status: u16) {
        self.behavior.lock().unwrap().default_response = MockResponse::Status {
            status,
            body: DEFAULT_BODY.to_vec(),
        };
    }

    /// Time each transfer takes
    pub fn set_delay(&self, delay: Duration) {
        self.behavior.lock().unwrap().delay = delay;
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.behavior
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|called| *called == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.behavior.lock().unwrap().calls.len()
    }

    /// URLs in the order they were requested
    pub fn requested_urls(&self) -> Vec<String> {
        self.behavior.lock().unwrap().calls.clone()
    }

    /// Highest number of transfers that were running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<TransferStatus> {
        let (response, delay) = {
            let mut behavior = self.behavior.lock().unwrap();
            behavior.calls.push(url.to_string());
            let response = behavior
                .responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| behavior.default_response.clone());
            (response, behavior.delay)
        };

        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        let result = match response {
            MockResponse::TransportError(message) => {
                pause(delay).await;
                Err(TransferError::transport(url, message).into())
            }
            MockResponse::Status { status, body } => {
                self.transfer(destination, TransferStatus::new(status), &body, delay).await
            }
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockDownloader {
    async fn transfer(
        &self,
        destination: &Path,
        status: TransferStatus,
        body: &[u8],
        delay: Duration,
    ) -> Result<TransferStatus> {
        if !status.is_success() {
            pause(delay).await;
            return Ok(status);
        }

        let partial = partial_path(destination);
        self.store.write(&partial, &body[..body.len() / 2]).await?;
        pause(delay).await;
        self.store.write(&partial, body).await?;
        self.store.rename(&partial, destination)?;
        Ok(status)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
