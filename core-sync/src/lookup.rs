//! Existing-entity lookup
//!
//! One batched query per batch, joined back to drafts by business identifier.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bridge_traits::{RemoteStore, SyncResource};
use tracing::{debug, instrument};

use crate::cache::IdentifierCache;
use crate::error::{Result, SyncError};

pub struct ExistingEntityLookup<R: SyncResource> {
    store: Arc<dyn RemoteStore<R>>,
    cache: Arc<IdentifierCache>,
}

impl<R: SyncResource> ExistingEntityLookup<R> {
    pub fn new(store: Arc<dyn RemoteStore<R>>, cache: Arc<IdentifierCache>) -> Self {
        Self { store, cache }
    }

    /// Fetch the existing entities matching `identifiers`, indexed by identifier.
    ///
    /// An empty set returns an empty map without calling the store. Entities
    /// with a self reference are recorded in the identifier cache.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ExistingEntityFetch`] if the query fails.
    #[instrument(skip(self, identifiers), fields(resource = R::RESOURCE_NAME, count = identifiers.len()))]
    pub async fn fetch(
        &self,
        identifiers: &HashSet<R::Identifier>,
    ) -> Result<HashMap<R::Identifier, R::Entity>> {
        if identifiers.is_empty() {
            return Ok(HashMap::new());
        }

        let entities = self
            .store
            .fetch_by_identifiers(identifiers)
            .await
            .map_err(|source| SyncError::ExistingEntityFetch {
                resource: R::RESOURCE_NAME,
                identifiers: join_identifiers::<R>(identifiers),
                source,
            })?;

        let mut existing = HashMap::with_capacity(entities.len());
        for entity in entities {
            if let Some((reference_type, key)) = R::self_reference(&entity) {
                self.cache
                    .insert(reference_type, key, R::entity_id(&entity))
                    .await;
            }
            existing.insert(R::entity_identifier(&entity), entity);
        }

        debug!(found = existing.len(), "Fetched existing entities");
        Ok(existing)
    }
}

fn join_identifiers<R: SyncResource>(identifiers: &HashSet<R::Identifier>) -> String {
    let mut rendered: Vec<String> = identifiers.iter().map(ToString::to_string).collect();
    rendered.sort();
    rendered.join(", ")
}
