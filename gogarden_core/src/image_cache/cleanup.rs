//! Size-bounded cleanup of the cache directory
//!
//! A single best-effort pass: the directory may grow past the budget again
//! between runs. Staged `.part` bodies never count toward the budget; they
//! are only removed once nothing has written to them for
//! [`STALE_PARTIAL_AGE`].

use super::policy::CachePolicy;
use crate::providers::{FileStat, FileStore, is_partial_name};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Idle time after which a staged body is treated as abandoned
pub const STALE_PARTIAL_AGE: Duration = Duration::from_secs(10 * 60);

/// Summary of one cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub scanned: usize,
    pub deleted: usize,
    pub retained: usize,
    pub retained_bytes: u64,
    /// Files that could not be inspected or deleted
    pub failed: usize,
}

/// Delete expired files and the oldest files beyond the size budget
///
/// Files are ranked by modification time. The newest files that are not
/// expired are kept while they fit under `max_size_bytes`; once one does not
/// fit, it and everything older is removed. Deletions run oldest first.
pub async fn cleanup_old_files(
    store: &dyn FileStore,
    dir: &Path,
    policy: &CachePolicy,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    let names = match store.list_dir(dir).await {
        Ok(names) => names,
        Err(e) if e.is_not_found() => return report,
        Err(e) => {
            warn!("Failed to list cache directory {}: {e}", dir.display());
            return report;
        }
    };

    let stats = join_all(names.iter().map(|name| {
        let path = dir.join(name);
        async move {
            let stat = store.stat(&path).await;
            (is_partial_name(name), path, stat)
        }
    }))
    .await;

    let now = SystemTime::now();
    let mut files: Vec<(PathBuf, FileStat)> = Vec::with_capacity(stats.len());
    let mut abandoned: Vec<PathBuf> = Vec::new();
    for (partial, path, stat) in stats {
        report.scanned += 1;
        match stat {
            Ok(Some(stat)) if partial => {
                let idle = now.duration_since(stat.modified_at).unwrap_or_default();
                if idle > STALE_PARTIAL_AGE {
                    abandoned.push(path);
                }
            }
            Ok(Some(stat)) => files.push((path, stat)),
            // Removed between listing and stat
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to stat {}: {e}", path.display());
                report.failed += 1;
            }
        }
    }

    files.sort_by_key(|(_, stat)| stat.modified_at);

    let mut keep = vec![false; files.len()];
    for (slot, (_, stat)) in keep.iter_mut().zip(files.iter()).rev() {
        if policy.is_expired(stat.modified_at, now) {
            break;
        }
        let total = report.retained_bytes + stat.size_bytes;
        if total > policy.max_size_bytes {
            break;
        }
        report.retained_bytes = total;
        report.retained += 1;
        *slot = true;
    }

    let doomed = files
        .iter()
        .zip(keep)
        .filter(|(_, keep)| !keep)
        .map(|((path, _), _)| path);
    for path in abandoned.iter().chain(doomed) {
        match store.remove_file(path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                report.deleted += 1;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!("Failed to delete {}: {e}", path.display());
                report.failed += 1;
            }
        }
    }

    info!(
        "Cache cleanup: scanned {}, deleted {}, kept {} ({} bytes)",
        report.scanned, report.deleted, report.retained, report.retained_bytes
    );
    report
}
