use crate::model::SentimentSnapshot;
use crate::utils::normalize_key;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CacheEntry {
    snapshot: Arc<SentimentSnapshot>,
    generated_at: Instant,
}

/// Per-technology snapshots with a fixed time-to-live.
pub struct SnapshotCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh snapshot for `technology`, if any.
    pub async fn get(&self, technology: &str) -> Option<Arc<SentimentSnapshot>> {
        let entries = self.entries.lock().await;
        let entry = entries.get(&normalize_key(technology))?;
        if entry.generated_at.elapsed() < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    pub async fn put(&self, technology: &str, snapshot: Arc<SentimentSnapshot>) {
        self.insert_with_age(technology, snapshot, Duration::ZERO).await;
    }

    /// Inserts a snapshot that was generated `age` ago (restored from storage).
    pub async fn insert_with_age(&self, technology: &str, snapshot: Arc<SentimentSnapshot>, age: Duration) {
        let generated_at = Instant::now().checked_sub(age).unwrap_or_else(Instant::now);
        self.entries
            .lock()
            .await
            .insert(normalize_key(technology), CacheEntry { snapshot, generated_at });
    }

    /// Keys of entries that have not expired, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.generated_at.elapsed() < self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.keys().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_snapshot;

    fn snapshot(technology: &str) -> Arc<SentimentSnapshot> {
        Arc::new(sample_snapshot(technology, &[]))
    }

    #[tokio::test]
    async fn keys_are_normalized() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        cache.put(" React ", snapshot("react")).await;
        assert!(cache.get("react").await.is_some());
        assert!(cache.get("REACT").await.is_some());
        assert_eq!(cache.keys().await, vec!["react"]);
        assert!(cache.get("vue").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_ignored() {
        let cache = SnapshotCache::new(Duration::from_millis(50));
        cache.put("vue", snapshot("vue")).await;
        cache.insert_with_age("svelte", snapshot("svelte"), Duration::from_secs(3600)).await;
        assert_eq!(cache.len().await, 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("vue").await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
