//! Cache key and file path derivation
//!
//! Keys are pure functions of the source URL: no salt, no clock. They are
//! ASCII-only, contain no path separators and stay under
//! [`MAX_KEY_LEN`] characters.

use std::path::{Path, PathBuf};
use url::Url;

/// Upper bound on the key length (file name without extension)
pub const MAX_KEY_LEN: usize = 100;

/// Length of the key used for inputs that do not parse as URLs
pub const FALLBACK_KEY_LEN: usize = 50;

/// Extension used when the URL path has no recognizable image extension
pub const DEFAULT_EXTENSION: &str = "jpg";

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "avif", "heic", "tif", "tiff",
];

// "_" + 8 hex digits of CRC32
const DIGEST_SUFFIX_LEN: usize = 9;

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Derive the stable on-disk key for `url`
///
/// Host and path are sanitized and joined, then a CRC32 of the full URL is
/// appended so that URLs differing only in their query string (sized CDN
/// variants) or past the truncation point still get distinct files.
pub fn derive_cache_key(url: &str) -> String {
    let parts = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| (sanitize(host), sanitize(parsed.path()))));

    match parts {
        Some((host, path)) => {
            let mut key = format!("{host}_{path}");
            key.truncate(MAX_KEY_LEN - DIGEST_SUFFIX_LEN);
            format!("{key}_{:08x}", crc32fast::hash(url.as_bytes()))
        }
        None => {
            let mut key = sanitize(url);
            key.truncate(FALLBACK_KEY_LEN);
            key
        }
    }
}

/// Pick the file extension for `url`
pub fn derive_extension(url: &str) -> &'static str {
    let Ok(parsed) = Url::parse(url) else {
        return DEFAULT_EXTENSION;
    };

    parsed
        .path()
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .and_then(|ext| IMAGE_EXTENSIONS.iter().copied().find(|known| *known == ext))
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Maps source URLs to files inside one flat cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    dir: PathBuf,
}

impl CachePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/<key>.<ext>`
    pub fn file_path(&self, url: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", derive_cache_key(url), derive_extension(url)))
    }
}
