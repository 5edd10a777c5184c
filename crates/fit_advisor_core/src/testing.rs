//! Scripted fakes for the core ports, shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::ports::{GenerationRequest, GenerationService, KeyValueStore, PortError, PortResult, TextStream};

/// Answers each call with the next scripted result and records every request.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<PortResult<String>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<PortResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: GenerationRequest) -> PortResult<String> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::CollaboratorUnavailable("script exhausted".into())))
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> PortResult<String> {
        self.next(request)
    }

    /// Streams the scripted reply split on whitespace boundaries.
    async fn generate_stream(&self, request: GenerationRequest) -> PortResult<TextStream> {
        let text = self.next(request)?;
        let chunks: Vec<PortResult<String>> = text
            .split_inclusive(' ')
            .map(|c| Ok(c.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// A map-backed store that ignores expiry but records the last TTL per key.
#[derive(Default)]
pub struct MapStore {
    values: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<String, Vec<String>>>,
    pub ttls: Mutex<HashMap<String, Duration>>,
}

impl MapStore {
    pub fn raw_list(&self, key: &str) -> Vec<String> {
        self.lists.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    pub fn push_raw(&self, key: &str, value: &str) {
        self.lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MapStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        Ok(())
    }

    async fn list_append(&self, key: &str, value: &str) -> PortResult<()> {
        self.push_raw(key, value);
        Ok(())
    }

    async fn list_range(&self, key: &str) -> PortResult<Vec<String>> {
        Ok(self.raw_list(key))
    }

    async fn list_trim(&self, key: &str, keep_last: usize) -> PortResult<()> {
        if let Some(list) = self.lists.lock().unwrap().get_mut(key) {
            let excess = list.len().saturating_sub(keep_last);
            list.drain(..excess);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.values.lock().unwrap().remove(key);
        self.lists.lock().unwrap().remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> PortResult<()> {
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        Ok(())
    }
}
