//! Cache policy constants

use crate::error::{Result, ValidationError};
use std::time::{Duration, SystemTime};

/// Files older than this are treated as absent and deleted on access
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Size budget enforced by the cleanup sweep
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 50 * 1024 * 1024;

/// Pause between two background preload downloads
pub const DEFAULT_PRELOAD_THROTTLE: Duration = Duration::from_millis(100);

/// Expiry, size and throttle settings for one cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_age: Duration,
    pub max_size_bytes: u64,
    pub preload_throttle: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_CACHE_AGE,
            max_size_bytes: DEFAULT_MAX_CACHE_SIZE,
            preload_throttle: DEFAULT_PRELOAD_THROTTLE,
        }
    }
}

impl CachePolicy {
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_preload_throttle(mut self, throttle: Duration) -> Self {
        self.preload_throttle = throttle;
        self
    }

    /// Reject policies that would make every file instantly stale
    pub fn validate(&self) -> Result<()> {
        if self.max_age.is_zero() {
            return Err(
                ValidationError::invalid_configuration("max_age must be greater than zero").into(),
            );
        }
        if self.max_size_bytes == 0 {
            return Err(
                ValidationError::invalid_configuration("max_size_bytes must be greater than zero")
                    .into(),
            );
        }
        Ok(())
    }

    /// A file is expired once its age reaches `max_age`
    ///
    /// Modification times in the future count as age zero.
    pub fn is_expired(&self, modified_at: SystemTime, now: SystemTime) -> bool {
        age_since(modified_at, now) >= self.max_age
    }
}

/// Age of a file at `now`, clamped at zero
pub fn age_since(modified_at: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(modified_at).unwrap_or(Duration::ZERO)
}
