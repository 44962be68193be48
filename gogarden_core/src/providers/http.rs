//! HTTP downloader backed by `reqwest`

use crate::error::{IoError, Result};
use crate::providers::{Downloader, TransferStatus, partial_path};
use async_trait::async_trait;
use log::{debug, trace};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Default user agent sent with image requests
pub const DEFAULT_USER_AGENT: &str = concat!("gogarden/", env!("CARGO_PKG_VERSION"));

/// Settings for [`HttpDownloader`]
#[derive(Debug, Clone)]
pub struct HttpDownloaderConfig {
    /// Whole-request timeout, `None` keeps the transport default
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpDownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// [`Downloader`] that streams response bodies into the cache directory
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Create a downloader with the default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpDownloaderConfig::default())
    }

    /// Create a downloader with explicit settings
    pub fn with_config(config: HttpDownloaderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Reuse an existing client (shared connection pool)
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<TransferStatus> {
        trace!("GET {url}");
        let mut response = self.client.get(url).send().await?;
        let status = TransferStatus::new(response.status().as_u16());

        if !status.is_success() {
            debug!("{url} answered {}", status.status_code);
            return Ok(status);
        }

        let partial = partial_path(destination);
        let written = match stream_to_file(&mut response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                discard_partial(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, destination).await {
            discard_partial(&partial).await;
            return Err(IoError::from_std(e).with_path(destination).into());
        }

        trace!("{url}: wrote {written} bytes to {}", destination.display());
        Ok(status)
    }
}

async fn stream_to_file(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path)
        .await
        .map_err(|e| IoError::from_std(e).with_path(path))?;

    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| IoError::from_std(e).with_path(path))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| IoError::from_std(e).with_path(path))?;

    Ok(written)
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!("Failed to remove partial download {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const BODY_LEN: usize = 1000;
    const HEAD_LEN: usize = 100;

    /// Serve one response that pauses after the first `HEAD_LEN` bytes
    ///
    /// The rest of the body is sent once `resume` fires; dropping the sender
    /// closes the connection short of `Content-Length` instead.
    async fn stalling_server() -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (resume, resumed) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let header = format!("HTTP/1.1 200 OK\r\nContent-Length: {BODY_LEN}\r\n\r\n");
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&[b'a'; HEAD_LEN]).await.unwrap();
            socket.flush().await.unwrap();

            if resumed.await.is_ok() {
                let _ = socket.write_all(&[b'b'; BODY_LEN - HEAD_LEN]).await;
                let _ = socket.flush().await;
            }
        });

        (format!("http://{addr}/leaf.jpg"), resume)
    }

    #[test]
    fn test_default_config_has_no_timeout() {
        let config = HttpDownloaderConfig::default();
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("gogarden/"));
    }

    #[test]
    fn test_downloader_builds_with_timeout() {
        let config = HttpDownloaderConfig {
            timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        assert!(HttpDownloader::with_config(config).is_ok());
    }

    #[tokio::test]
    async fn test_destination_appears_only_when_body_completes() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("leaf.jpg");
        let (url, resume) = stalling_server().await;

        let downloader = HttpDownloader::new().unwrap();
        let target = destination.clone();
        let transfer = tokio::spawn(async move { downloader.download(&url, &target).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!destination.exists());
        assert!(partial_path(&destination).exists());

        resume.send(()).unwrap();
        let status = transfer.await.unwrap().unwrap();

        assert!(status.is_success());
        assert_eq!(std::fs::read(&destination).unwrap().len(), BODY_LEN);
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("leaf.jpg");
        let (url, resume) = stalling_server().await;

        let downloader = HttpDownloader::new().unwrap();
        let target = destination.clone();
        let transfer = tokio::spawn(async move { downloader.download(&url, &target).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(resume);

        assert!(transfer.await.unwrap().is_err());
        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }
}
