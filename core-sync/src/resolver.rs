//! Reference Resolution
//!
//! Rewrites the key references of drafts into id references. Keys are
//! fetched in one request per reference type and batch, then served from the
//! [`IdentifierCache`]. In ensure mode a missing referenced entity is created
//! once, even when several drafts of a batch need it at the same time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bridge_traits::{ReferenceStore, ReferenceType, ResolvedReferences, ResourceRef, SyncResource};
use core_async::sync::{Mutex, OnceCell};
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::cache::IdentifierCache;
use crate::error::{Result, SyncError};
use crate::validator::ReferenceKeys;

type PendingCreation = Arc<OnceCell<String>>;

pub struct ReferenceResolver {
    references: Arc<dyn ReferenceStore>,
    cache: Arc<IdentifierCache>,
    ensure_referenced_entities: bool,
    pending_creations: Mutex<HashMap<(ReferenceType, String), PendingCreation>>,
}

impl ReferenceResolver {
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        cache: Arc<IdentifierCache>,
        ensure_referenced_entities: bool,
    ) -> Self {
        Self {
            references,
            cache,
            ensure_referenced_entities,
            pending_creations: Mutex::new(HashMap::new()),
        }
    }

    /// Make sure every key of the batch is cached, as far as the remote
    /// store knows it.
    ///
    /// Returns the mappings known for this batch. Keys unknown to the remote
    /// store are absent; they fail (or get created) during [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CachePopulation`] if any per-type fetch fails.
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    pub async fn populate_cache(&self, keys: &ReferenceKeys) -> Result<ResolvedReferences> {
        let mut snapshot = ResolvedReferences::new();
        let mut to_fetch = Vec::new();

        for (reference_type, type_keys) in keys.iter() {
            let non_blank: HashSet<String> = type_keys
                .iter()
                .filter(|key| !key.trim().is_empty())
                .cloned()
                .collect();
            let missing = self
                .cache
                .lookup_many(reference_type, &non_blank, &mut snapshot)
                .await;
            if !missing.is_empty() {
                to_fetch.push((reference_type, missing));
            }
        }

        if to_fetch.is_empty() {
            debug!("All referenced keys already cached");
            return Ok(snapshot);
        }

        let fetches = to_fetch.iter().map(|(reference_type, missing)| async move {
            debug!(%reference_type, count = missing.len(), "Fetching reference ids");
            self.references
                .fetch_ids_by_keys(*reference_type, missing)
                .await
                .map(|ids| (*reference_type, ids))
                .map_err(|source| SyncError::CachePopulation {
                    reference_type: *reference_type,
                    source,
                })
        });

        for (reference_type, ids) in try_join_all(fetches).await? {
            for (key, id) in ids {
                snapshot.insert(reference_type, key.as_str(), id.as_str());
                self.cache.insert(reference_type, key, id).await;
            }
        }

        Ok(snapshot)
    }

    /// Replace every key reference of `draft` with an id reference.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ReferenceResolution`] when a key is unknown and
    /// ensure mode is off, or when creating the referenced entity fails.
    pub async fn resolve<R: SyncResource>(
        &self,
        draft: R::Draft,
        snapshot: &ResolvedReferences,
    ) -> Result<R::Draft> {
        let mut resolved = ResolvedReferences::new();

        for (reference_type, reference) in R::references(&draft) {
            let key = match reference {
                ResourceRef::Key(key) => key,
                ResourceRef::Id(_) => continue,
            };

            let id = match snapshot.id_of(reference_type, &key) {
                Some(id) => id.to_string(),
                None => match self.cache.get(reference_type, &key).await {
                    Some(id) => id,
                    None if self.ensure_referenced_entities
                        && R::can_create_reference(reference_type) =>
                    {
                        self.ensure_created::<R>(&draft, reference_type, &key).await?
                    }
                    None => {
                        return Err(SyncError::ReferenceResolution {
                            identifier: identifier_of::<R>(&draft),
                            message: format!(
                                "'{}' reference with key '{}' does not exist",
                                reference_type, key
                            ),
                        })
                    }
                },
            };
            resolved.insert(reference_type, key, id);
        }

        Ok(R::apply_resolved(draft, &resolved))
    }

    async fn ensure_created<R: SyncResource>(
        &self,
        draft: &R::Draft,
        reference_type: ReferenceType,
        key: &str,
    ) -> Result<String> {
        let cell = {
            let mut pending = self.pending_creations.lock().await;
            Arc::clone(
                pending
                    .entry((reference_type, key.to_string()))
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let id = cell
            .get_or_try_init(|| async {
                let id = self.references.create_referenced(reference_type, key).await?;
                info!(%reference_type, %key, %id, "Created missing referenced entity");
                self.cache.insert(reference_type, key, id.as_str()).await;
                Ok::<_, bridge_traits::BridgeError>(id)
            })
            .await
            .map_err(|err| SyncError::ReferenceResolution {
                identifier: identifier_of::<R>(draft),
                message: format!(
                    "failed to create '{}' reference with key '{}': {}",
                    reference_type, key, err
                ),
            })?
            .clone();

        self.pending_creations
            .lock()
            .await
            .remove(&(reference_type, key.to_string()));

        Ok(id)
    }
}

fn identifier_of<R: SyncResource>(draft: &R::Draft) -> String {
    R::draft_identifier(draft)
        .map(|identifier| identifier.to_string())
        .unwrap_or_default()
}
