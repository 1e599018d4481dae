//! Extraction cache
//!
//! Memoizes extraction results, search listings, channel listings and image
//! bytes. Each owner holds its own instance; nothing here is process-global.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::Mutex;
use tracing::debug;

/// Whether an extraction ran with the saved credential file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialMode {
    Anonymous,
    Credentialed,
}

/// Key for memoized extraction work: reference, extra parameters, credential mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractionKey {
    pub reference: String,
    pub params: String,
    pub mode: CredentialMode,
}

impl ExtractionKey {
    pub fn new(reference: impl Into<String>, params: impl ToString, mode: CredentialMode) -> Self {
        Self {
            reference: reference.into(),
            params: params.to_string(),
            mode,
        }
    }
}

/// Async memoizing cache.
///
/// Only successful results are stored. Concurrent misses for the same key are
/// not deduplicated: both producers run and the last write wins.
pub struct Cache<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, or run `producer` and store its
    /// result if it succeeds.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!("{} cache hit: {:?}", self.name, key);
            return Ok(hit);
        }

        debug!("{} cache miss: {:?}", self.name, key);
        let value = producer().await?;

        self.entries.lock().await.insert(key, value.clone());
        Ok(value)
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn invalidate(&self, key: &K) -> Option<V> {
        self.entries.lock().await.remove(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
