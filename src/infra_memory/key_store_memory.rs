use crate::domain_port::{KeyStore, KeyStoreError};
use dashmap::DashMap;
use tracing::debug;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    deadline: Instant,
}

/// In-process expiring store for tests and single-process runs.
///
/// Entries are evicted when touched after their deadline, and by the task from
/// [`MemoryKeyStore::spawn_sweeper`] for entries nobody touches again. State is
/// not shared between processes. Uses tokio's clock so paused-time tests can
/// drive expiry.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self, key: &str) -> Option<StoredEntry> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.deadline > now => return Some(entry.value().clone()),
            Some(_) => {}
            None => return None,
        }
        self.entries.remove_if(key, |_, entry| entry.deadline <= now);
        None
    }

    /// Time left before `key` expires, if it is live.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.live(key)
            .map(|entry| entry.deadline.saturating_duration_since(Instant::now()))
    }

    fn evict_expired(entries: &DashMap<String, StoredEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.deadline > now);
    }

    /// Periodically drop expired entries. The task ends once every handle to
    /// this store is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let entries: Weak<DashMap<String, StoredEntry>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let before = entries.len();
                Self::evict_expired(&entries);
                let evicted = before.saturating_sub(entries.len());
                if evicted > 0 {
                    debug!(evicted, "swept expired entries");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        Self::evict_expired(&self.entries);
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.live(key).map(|entry| entry.value))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), KeyStoreError> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                deadline: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn extend_ttl(&self, key: &str, ttl: Duration) -> Result<bool, KeyStoreError> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.deadline > now => {
                entry.deadline = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, KeyStoreError> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| entry.deadline > now)
            .count();
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryKeyStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn extend_ttl_only_touches_live_entries() {
        let store = MemoryKeyStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(store.extend_ttl("k", Duration::from_secs(10)).await.unwrap());
        assert_eq!(store.remaining_ttl("k"), Some(Duration::from_secs(10)));
        assert!(!store.extend_ttl("missing", Duration::from_secs(10)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_untouched_expired_entries() {
        let store = MemoryKeyStore::new();
        store
            .set_with_ttl("short", "v", Duration::from_secs(5))
            .await
            .unwrap();
        store
            .set_with_ttl("long", "v", Duration::from_secs(600))
            .await
            .unwrap();
        let _sweeper = store.spawn_sweeper(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.entries.len(), 1);
        assert!(store.entries.contains_key("long"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_with_the_store() {
        let store = MemoryKeyStore::new();
        let sweeper = store.spawn_sweeper(Duration::from_secs(1));
        drop(store);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sweeper.is_finished());
    }

    #[tokio::test]
    async fn delete_many_counts_existing_keys() {
        let store = MemoryKeyStore::new();
        store
            .set_with_ttl("a", "1", Duration::from_secs(10))
            .await
            .unwrap();
        store
            .set_with_ttl("b", "2", Duration::from_secs(10))
            .await
            .unwrap();

        let removed = store
            .delete_many(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.is_empty());
    }
}
