//! Freshness checks against the cache directory
//!
//! Expiry is discovered lazily: a stale file is only deleted when its URL is
//! asked for again, or by the next [`cleanup`](super::cleanup) sweep.

use super::key::CachePaths;
use super::policy::{CachePolicy, age_since};
use crate::providers::{FileStat, FileStore};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Result of inspecting the derived file for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// File exists and is younger than the max age
    Fresh { path: PathBuf, stat: FileStat },
    /// File exists but reached the max age
    Stale { path: PathBuf, age: Duration },
    /// Nothing usable on disk
    Missing,
}

#[derive(Clone)]
pub struct FreshnessChecker {
    store: Arc<dyn FileStore>,
    paths: CachePaths,
    policy: CachePolicy,
}

impl FreshnessChecker {
    pub fn new(store: Arc<dyn FileStore>, paths: CachePaths, policy: CachePolicy) -> Self {
        Self {
            store,
            paths,
            policy,
        }
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Inspect the cached file for `url` without side effects
    ///
    /// A failing stat is logged and reported as [`Freshness::Missing`].
    pub async fn check(&self, url: &str) -> Freshness {
        let path = self.paths.file_path(url);
        let stat = match self.store.stat(&path).await {
            Ok(Some(stat)) => stat,
            Ok(None) => return Freshness::Missing,
            Err(e) => {
                warn!("Failed to stat {}: {e}", path.display());
                return Freshness::Missing;
            }
        };

        let now = SystemTime::now();
        if self.policy.is_expired(stat.modified_at, now) {
            Freshness::Stale {
                path,
                age: age_since(stat.modified_at, now),
            }
        } else {
            Freshness::Fresh { path, stat }
        }
    }

    /// Path of a usable cached file for `url`
    ///
    /// Stale files are deleted before returning `None`.
    pub async fn is_cached(&self, url: &str) -> Option<PathBuf> {
        if url.trim().is_empty() {
            return None;
        }

        match self.check(url).await {
            Freshness::Fresh { path, .. } => {
                debug!("Cache hit for {url}");
                Some(path)
            }
            Freshness::Stale { path, age } => {
                debug!("Evicting stale entry for {url} ({}s old)", age.as_secs());
                if let Err(e) = self.store.remove_file(&path).await
                    && !e.is_not_found()
                {
                    warn!("Failed to delete stale file {}: {e}", path.display());
                }
                None
            }
            Freshness::Missing => None,
        }
    }
}
