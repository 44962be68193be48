//! Load attempts for a single candidate

use crate::error::TransferError;
use crate::image_cache::{ImageCacheManager, ImageUri};
use crate::providers::{FileStore, TokioFileStore};
use async_trait::async_trait;
use image::ImageReader;
use log::trace;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// Why a candidate could not be shown
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// No bytes could be obtained: missing URL, fetch failure, unreadable file
    #[error("Image unavailable: {reason}")]
    Unavailable { reason: String },

    /// Bytes were obtained but are not a decodable image
    #[error("Failed to decode {uri}: {reason}")]
    Decode { uri: ImageUri, reason: String },
}

impl LoadFailure {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn decode(uri: &ImageUri, reason: impl Into<String>) -> Self {
        Self::Decode {
            uri: uri.clone(),
            reason: reason.into(),
        }
    }
}

/// Display-side loader: decides whether a resolved URI actually renders
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, uri: &ImageUri) -> Result<(), LoadFailure>;
}

/// Resolve `url` through the cache and try to load the result
pub async fn attempt_load(
    cache: &ImageCacheManager,
    loader: &dyn ImageLoader,
    url: &str,
) -> Result<ImageUri, LoadFailure> {
    let uri = cache
        .get_image_uri(url)
        .await
        .ok_or_else(|| LoadFailure::unavailable("no image URL"))?;
    trace!("Loading {uri}");
    loader.load(&uri).await?;
    Ok(uri)
}

/// [`ImageLoader`] that fetches the bytes and checks that they decode
#[derive(Clone)]
pub struct DecodingLoader {
    store: Arc<dyn FileStore>,
    client: reqwest::Client,
}

impl DecodingLoader {
    pub fn new(store: Arc<dyn FileStore>, client: reqwest::Client) -> Self {
        Self { store, client }
    }

    async fn read_bytes(&self, uri: &ImageUri) -> Result<Vec<u8>, LoadFailure> {
        match uri {
            ImageUri::Local(path) => self
                .store
                .read(path)
                .await
                .map_err(|e| LoadFailure::unavailable(e.to_string())),
            ImageUri::Remote(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| LoadFailure::unavailable(crate::Error::from(e).to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadFailure::unavailable(
                        TransferError::http_status(url, status.as_u16()).to_string(),
                    ));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| LoadFailure::unavailable(crate::Error::from(e).to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl Default for DecodingLoader {
    fn default() -> Self {
        Self::new(Arc::new(TokioFileStore::new()), reqwest::Client::new())
    }
}

/// Sniff the format and read the header dimensions
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    if reader.format().is_none() {
        return Err("unrecognized image format".to_string());
    }
    reader.into_dimensions().map_err(|e| e.to_string())
}

#[async_trait]
impl ImageLoader for DecodingLoader {
    async fn load(&self, uri: &ImageUri) -> Result<(), LoadFailure> {
        let bytes = self.read_bytes(uri).await?;
        if bytes.is_empty() {
            return Err(LoadFailure::decode(uri, "empty body"));
        }
        let (width, height) =
            decode_dimensions(&bytes).map_err(|reason| LoadFailure::decode(uri, reason))?;
        trace!("{uri} decoded as {width}x{height}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // 1x1 transparent PNG
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_decode_dimensions() {
        assert_eq!(decode_dimensions(PNG_1X1), Ok((1, 1)));
        assert!(decode_dimensions(b"<html>not an image</html>").is_err());
    }

    #[tokio::test]
    async fn test_local_png_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, PNG_1X1).unwrap();

        let loader = DecodingLoader::default();
        assert!(loader.load(&ImageUri::Local(path)).await.is_ok());
    }

    #[tokio::test]
    async fn test_local_garbage_is_decode_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let loader = DecodingLoader::default();
        let uri = ImageUri::Local(path);
        match loader.load(&uri).await {
            Err(LoadFailure::Decode { uri: failed, .. }) => assert_eq!(failed, uri),
            other => panic!("Expected decode failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_local_file_is_unavailable() {
        let loader = DecodingLoader::default();
        let result = loader
            .load(&ImageUri::Local(PathBuf::from("/definitely/not/here.png")))
            .await;
        assert!(matches!(result, Err(LoadFailure::Unavailable { .. })));
    }
}
