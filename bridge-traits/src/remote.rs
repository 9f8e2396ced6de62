//! Remote Resource Store
//!
//! The narrow interface through which the engine reads and writes the
//! resources it synchronizes. Transport, serialization, timeouts and backoff
//! all live behind this trait.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;
use crate::resource::SyncResource;

/// Address of a single entity for point lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdOrKey {
    Id(String),
    Key(String),
}

impl fmt::Display for IdOrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdOrKey::Id(id) => write!(f, "id '{}'", id),
            IdOrKey::Key(key) => write!(f, "key '{}'", key),
        }
    }
}

/// Remote store holding the entities of resource type `R`.
///
/// # Conflicts
///
/// `update` must report a version mismatch as
/// [`BridgeError::Conflict`](crate::error::BridgeError::Conflict) so the
/// engine can re-fetch and retry. Every other failure should use one of the
/// remaining variants.
#[async_trait]
pub trait RemoteStore<R: SyncResource>: Send + Sync {
    /// Fetch every entity whose business identifier is in `identifiers`,
    /// in one batched query.
    async fn fetch_by_identifiers(
        &self,
        identifiers: &HashSet<R::Identifier>,
    ) -> Result<Vec<R::Entity>>;

    /// Create a new entity from a resolved draft
    async fn create(&self, draft: &R::Draft) -> Result<R::Entity>;

    /// Apply `actions` to `entity` at its current version and return the
    /// updated entity
    async fn update(&self, entity: &R::Entity, actions: &[R::Action]) -> Result<R::Entity>;

    /// Fetch a single entity, `None` when it does not exist
    async fn fetch_by_id_or_key(&self, id_or_key: &IdOrKey) -> Result<Option<R::Entity>>;
}
