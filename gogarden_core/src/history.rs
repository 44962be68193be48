//! Plant identification history
//!
//! A small JSON array kept next to the image cache, newest entry first.

use crate::error::Result;
use crate::providers::FileStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default file name inside the data directory
pub const HISTORY_FILE_NAME: &str = "plant-identification-history.json";

/// Entries kept before the oldest are dropped
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

const UNKNOWN_PLANT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub plant_name: String,
    #[serde(default)]
    pub scientific_name: String,
    /// Percentage in `0.0..=100.0`
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub matched_in_database: bool,
}

/// Input for [`IdentificationHistory::record`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIdentification {
    pub plant_name: Option<String>,
    pub scientific_name: Option<String>,
    pub confidence: f64,
    pub image_uri: Option<String>,
    pub matched_in_database: bool,
}

pub struct IdentificationHistory {
    store: Arc<dyn FileStore>,
    path: PathBuf,
    capacity: usize,
    // Last issued id; the lock also serializes read-modify-write cycles
    last_id: Mutex<i64>,
}

impl IdentificationHistory {
    pub fn new(store: Arc<dyn FileStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            capacity: DEFAULT_HISTORY_CAPACITY,
            last_id: Mutex::new(0),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All entries, newest first
    ///
    /// A missing or unreadable file yields an empty history.
    pub async fn load(&self) -> Vec<HistoryEntry> {
        match self.read_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load identification history from {}: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Prepend a new entry and persist, evicting beyond capacity
    pub async fn record(&self, identification: NewIdentification) -> Option<HistoryEntry> {
        let mut last_id = self.last_id.lock().await;
        let mut entries = self.load().await;

        let newest_on_disk = entries
            .first()
            .and_then(|entry| entry.id.parse::<i64>().ok())
            .unwrap_or(0);
        let now = Utc::now();
        let id = now.timestamp_millis().max(*last_id + 1).max(newest_on_disk + 1);

        let entry = HistoryEntry {
            id: id.to_string(),
            date: now,
            plant_name: identification
                .plant_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_PLANT.to_string()),
            scientific_name: identification.scientific_name.unwrap_or_default(),
            confidence: clamp_confidence(identification.confidence),
            image_uri: identification.image_uri,
            matched_in_database: identification.matched_in_database,
        };

        entries.insert(0, entry.clone());
        entries.truncate(self.capacity);

        match self.write_entries(&entries).await {
            Ok(()) => {
                *last_id = id;
                debug!("Recorded identification {} ({})", entry.id, entry.plant_name);
                Some(entry)
            }
            Err(e) => {
                warn!("Failed to save identification history to {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Delete the history file
    pub async fn clear(&self) -> bool {
        let _guard = self.last_id.lock().await;
        match self.store.remove_file(&self.path).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                warn!("Failed to clear identification history: {e}");
                false
            }
        }
    }

    async fn read_entries(&self) -> Result<Vec<HistoryEntry>> {
        if self.store.stat(&self.path).await?.is_none() {
            return Ok(Vec::new());
        }
        let bytes = self.store.read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_entries(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.store.create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(entries)?;
        self.store.write(&self.path, &bytes).await
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 100.0)
    }
}
