//! Identifier Cache
//!
//! Key-to-id mappings of referenced resources, one bounded LRU per reference
//! type. Owned by a single orchestrator and kept across `process` calls, so a
//! key is fetched from the remote store at most once while it stays cached.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use bridge_traits::{ReferenceType, ResolvedReferences};
use core_async::sync::Mutex;
use lru::LruCache;
use tracing::trace;

use crate::error::{Result, SyncError};

struct TypeCache {
    ids: LruCache<String, String>,
    keys: HashMap<String, String>,
}

impl TypeCache {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            ids: LruCache::new(capacity),
            keys: HashMap::new(),
        }
    }

    fn insert(&mut self, key: String, id: String) {
        self.keys.insert(id.clone(), key.clone());
        if let Some((old_key, old_id)) = self.ids.push(key.clone(), id.clone()) {
            // Either the replaced value of `key` or an evicted entry
            if old_id != id && self.keys.get(&old_id) == Some(&old_key) {
                self.keys.remove(&old_id);
            }
        }
    }
}

/// Bounded key-to-id cache per reference type.
pub struct IdentifierCache {
    capacity: NonZeroUsize,
    types: Mutex<HashMap<ReferenceType, TypeCache>>,
}

impl IdentifierCache {
    /// Create a cache holding up to `capacity` keys per reference type
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] for a zero capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| SyncError::InvalidConfig {
            field: "cache_capacity".to_string(),
            message: "cache_capacity must be greater than zero".to_string(),
        })?;

        Ok(Self {
            capacity,
            types: Mutex::new(HashMap::new()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub async fn get(&self, reference_type: ReferenceType, key: &str) -> Option<String> {
        let mut types = self.types.lock().await;
        types
            .get_mut(&reference_type)
            .and_then(|cache| cache.ids.get(key).cloned())
    }

    /// Reverse lookup of the key an id was cached under
    pub async fn key_for_id(&self, reference_type: ReferenceType, id: &str) -> Option<String> {
        let types = self.types.lock().await;
        types
            .get(&reference_type)
            .and_then(|cache| cache.keys.get(id).cloned())
    }

    pub async fn insert(&self, reference_type: ReferenceType, key: impl Into<String>, id: impl Into<String>) {
        let key = key.into();
        let id = id.into();
        trace!(%reference_type, %key, %id, "Caching reference id");

        let mut types = self.types.lock().await;
        types
            .entry(reference_type)
            .or_insert_with(|| TypeCache::new(self.capacity))
            .insert(key, id);
    }

    /// Pre-populate the cache with known mappings
    pub async fn seed<I>(&self, reference_type: ReferenceType, mappings: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut types = self.types.lock().await;
        let cache = types
            .entry(reference_type)
            .or_insert_with(|| TypeCache::new(self.capacity));
        for (key, id) in mappings {
            cache.insert(key, id);
        }
    }

    /// Split `keys` into cached mappings (written into `found`) and the keys
    /// still missing
    pub async fn lookup_many(
        &self,
        reference_type: ReferenceType,
        keys: &HashSet<String>,
        found: &mut ResolvedReferences,
    ) -> HashSet<String> {
        let mut types = self.types.lock().await;
        let cache = types.get_mut(&reference_type);

        match cache {
            Some(cache) => keys
                .iter()
                .filter(|key| match cache.ids.get(key.as_str()) {
                    Some(id) => {
                        found.insert(reference_type, key.as_str(), id.as_str());
                        false
                    }
                    None => true,
                })
                .cloned()
                .collect(),
            None => keys.clone(),
        }
    }

    /// Number of cached keys across all reference types
    pub async fn len(&self) -> usize {
        let types = self.types.lock().await;
        types.values().map(|cache| cache.ids.len()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for IdentifierCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
