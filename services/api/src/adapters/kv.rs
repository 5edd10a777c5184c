//! services/api/src/adapters/kv.rs
//!
//! An in-process implementation of the `KeyValueStore` port with per-key expiry.
//!
//! Expiry is checked on access against `tokio::time::Instant`, so tests can
//! drive it with a paused clock. Expired keys nobody reads again are swept
//! whenever a new key is stored.

use async_trait::async_trait;
use fit_advisor_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Default)]
pub struct MemoryKvAdapter {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drops `key` if it has expired and returns what is left.
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        debug!("Evicting expired key {}", key);
        entries.remove(key);
    }
    entries.get_mut(key)
}

/// Drops every expired entry.
fn sweep(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, entry| entry.is_live(now));
    let evicted = before - entries.len();
    if evicted > 0 {
        debug!("Swept {} expired keys", evicted);
    }
}

fn wrong_type(key: &str) -> PortError {
    PortError::Unexpected(format!("Key {} holds a value of the wrong type", key))
}

#[async_trait]
impl KeyValueStore for MemoryKvAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        sweep(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn list_append(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            Some(Entry {
                value: Value::List(items),
                ..
            }) => items.push(value.to_string()),
            Some(_) => return Err(wrong_type(key)),
            None => {
                sweep(&mut entries);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::List(vec![value.to_string()]),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn list_range(&self, key: &str) -> PortResult<Vec<String>> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::List(items),
                ..
            }) => Ok(items.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn list_trim(&self, key: &str, keep_last: usize) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => Ok(()),
            Some(Entry {
                value: Value::List(items),
                ..
            }) => {
                let excess = items.len().saturating_sub(keep_last);
                items.drain(..excess);
                Ok(())
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = live(&mut entries, key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_their_ttl() {
        let kv = MemoryKvAdapter::new();
        kv.set("a", "1", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(kv.get("a").await.unwrap(), None);
        assert!(kv.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn storing_a_key_sweeps_unread_expired_ones() {
        let kv = MemoryKvAdapter::new();
        for i in 0..100 {
            kv.set(&format!("job:{}", i), "{}", Duration::from_secs(3600))
                .await
                .unwrap();
        }
        kv.list_append("session:old", "hi").await.unwrap();
        kv.expire("session:old", Duration::from_secs(60)).await.unwrap();
        kv.list_append("session:kept", "hi").await.unwrap();
        assert_eq!(kv.entries.lock().await.len(), 102);

        tokio::time::advance(Duration::from_secs(7200)).await;
        kv.set("job:new", "{}", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(kv.entries.lock().await.len(), 2);

        tokio::time::advance(Duration::from_secs(3600)).await;
        kv.list_append("session:new", "hi").await.unwrap();
        let entries = kv.entries.lock().await;
        let mut keys: Vec<_> = entries.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["session:kept", "session:new"]);
    }

    #[tokio::test]
    async fn lists_append_and_trim_from_the_front() {
        let kv = MemoryKvAdapter::new();
        for i in 0..5 {
            kv.list_append("l", &i.to_string()).await.unwrap();
        }
        kv.list_trim("l", 3).await.unwrap();
        assert_eq!(kv.list_range("l").await.unwrap(), vec!["2", "3", "4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_renews_a_list() {
        let kv = MemoryKvAdapter::new();
        kv.list_append("l", "x").await.unwrap();
        kv.expire("l", Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        kv.expire("l", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(kv.list_range("l").await.unwrap(), vec!["x"]);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(kv.list_range("l").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mixing_types_is_an_error() {
        let kv = MemoryKvAdapter::new();
        kv.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert!(kv.list_append("k", "x").await.is_err());
        kv.delete("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_keys_are_empty() {
        let kv = MemoryKvAdapter::new();
        assert_eq!(kv.get("nope").await.unwrap(), None);
        assert!(kv.list_range("nope").await.unwrap().is_empty());
        kv.list_trim("nope", 2).await.unwrap();
        kv.expire("nope", Duration::from_secs(1)).await.unwrap();
        assert!(kv.is_empty().await);
    }
}
