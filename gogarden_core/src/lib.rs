//! GoGarden Core Library
//!
//! Disk-backed caching for remote plant and article images, the
//! multi-source fallback used to display them, and the local plant
//! identification history.
//!
//! ```no_run
//! # async fn demo() -> gogarden_core::Result<()> {
//! use gogarden_core::ImageCacheManager;
//!
//! let cache = ImageCacheManager::with_defaults("/tmp/gogarden/plant-images")?;
//! cache.initialize().await;
//! if let Some(uri) = cache.get_image_uri("https://example.com/tomato.jpg").await {
//!     println!("display {uri}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fallback;
pub mod history;
pub mod image_cache;
pub mod providers;

// Re-export main types
pub use error::{Error, Result};
pub use fallback::{
    DecodingLoader, FallbackController, FallbackState, ImageLoader, ImageSubject, LoadFailure,
    Placeholder, Resolution, Season, attempt_load,
};
pub use history::{HistoryEntry, IdentificationHistory, NewIdentification};
pub use image_cache::{
    CachePolicy, CacheStats, CleanupReport, ImageCacheManager, ImageUri, default_cache_dir,
};
pub use providers::{
    Downloader, FileStat, FileStore, HttpDownloader, HttpDownloaderConfig, TokioFileStore,
    TransferStatus,
};
