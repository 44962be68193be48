//! Disk-backed image cache
//!
//! Remote images are stored in one flat directory under names derived from
//! their URLs. The directory listing is the only index that survives a
//! restart; [`MemoryIndex`] just saves repeated derivations.

pub mod cleanup;
pub mod fetch;
pub mod freshness;
pub mod index;
pub mod key;
pub mod manager;
pub mod policy;
pub mod preload;

pub use cleanup::{CleanupReport, cleanup_old_files};
pub use fetch::FetchEngine;
pub use freshness::{Freshness, FreshnessChecker};
pub use index::MemoryIndex;
pub use key::{CachePaths, derive_cache_key, derive_extension};
pub use manager::ImageCacheManager;
pub use policy::CachePolicy;
pub use preload::PreloadQueue;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Name of the cache directory inside the platform cache root
pub const CACHE_DIR_NAME: &str = "plant-images";

/// `<platform cache dir>/gogarden/plant-images`, if the platform has one
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gogarden").join(CACHE_DIR_NAME))
}

/// Where an image should be displayed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUri {
    /// A cached file that existed when the URI was resolved
    Local(PathBuf),
    /// The original URL, to be loaded straight from the network
    Remote(String),
}

impl ImageUri {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Displayable form: the file path or the URL
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Local(path) => path.to_string_lossy(),
            Self::Remote(url) => std::borrow::Cow::Borrowed(url),
        }
    }
}

impl fmt::Display for ImageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Counters reported by [`ImageCacheManager::get_cache_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub file_count: usize,
    pub total_size_bytes: u64,
    pub memory_cache_count: usize,
    pub queue_length: usize,
}

impl CacheStats {
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_uri_display() {
        let remote = ImageUri::Remote("https://x.com/a.jpg".to_string());
        assert_eq!(remote.to_string(), "https://x.com/a.jpg");
        assert!(!remote.is_local());

        let local = ImageUri::Local(PathBuf::from("/cache/a.jpg"));
        assert_eq!(local.as_str(), "/cache/a.jpg");
        assert!(local.is_local());
    }

    #[test]
    fn test_default_cache_dir_ends_with_plant_images() {
        if let Some(dir) = default_cache_dir() {
            assert!(dir.ends_with("gogarden/plant-images"));
        }
    }

    #[test]
    fn test_total_size_mb() {
        let stats = CacheStats {
            total_size_bytes: 3 * 1024 * 1024 / 2,
            ..Default::default()
        };
        assert!((stats.total_size_mb() - 1.5).abs() < f64::EPSILON);
    }
}
