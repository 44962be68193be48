//! In-process URL → file path index
//!
//! Purely an accelerator: it is never persisted and every hit is re-validated
//! against the filesystem before use.

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<HashMap<String, PathBuf>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<PathBuf> {
        self.entries.read().await.get(url).cloned()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.entries.read().await.contains_key(url)
    }

    pub async fn insert(&self, url: &str, path: PathBuf) {
        self.entries.write().await.insert(url.to_string(), path);
    }

    pub async fn remove(&self, url: &str) -> Option<PathBuf> {
        self.entries.write().await.remove(url)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let index = MemoryIndex::new();
        assert!(index.is_empty().await);

        index
            .insert("https://x/a.jpg", PathBuf::from("/c/a.jpg"))
            .await;
        assert_eq!(
            index.get("https://x/a.jpg").await,
            Some(PathBuf::from("/c/a.jpg"))
        );
        assert!(index.contains("https://x/a.jpg").await);
        assert_eq!(index.len().await, 1);

        assert!(index.remove("https://x/a.jpg").await.is_some());
        assert!(index.get("https://x/a.jpg").await.is_none());
    }

    #[tokio::test]
    async fn test_insert_replaces_existing_path() {
        let index = MemoryIndex::new();
        index.insert("u", PathBuf::from("/old")).await;
        index.insert("u", PathBuf::from("/new")).await;

        assert_eq!(index.len().await, 1);
        assert_eq!(index.get("u").await, Some(PathBuf::from("/new")));
    }

    #[tokio::test]
    async fn test_clear() {
        let index = MemoryIndex::new();
        index.insert("a", PathBuf::from("/a")).await;
        index.insert("b", PathBuf::from("/b")).await;
        index.clear().await;
        assert!(index.is_empty().await);
    }
}
