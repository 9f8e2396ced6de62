//! Cross-entity references
//!
//! Drafts point at other resources by human-readable key; the remote API
//! wants server-assigned ids. This module holds the vocabulary for both sides
//! and the [`ReferenceStore`] capability that maps one to the other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::Result;

/// The kind of resource a reference points at (e.g. `channel`, `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceType(&'static str);

impl ReferenceType {
    pub const CHANNEL: ReferenceType = ReferenceType("channel");
    pub const TYPE: ReferenceType = ReferenceType("type");
    pub const CUSTOMER_GROUP: ReferenceType = ReferenceType("customer-group");
    pub const TAX_CATEGORY: ReferenceType = ReferenceType("tax-category");
    pub const STATE: ReferenceType = ReferenceType("state");

    /// Declare a reference type not covered by the predefined constants
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A reference as carried by a draft or an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "by", content = "value")]
pub enum ResourceRef {
    /// Human-readable key, still to be resolved
    Key(String),
    /// Server-assigned id
    Id(String),
}

impl ResourceRef {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// The key, if this reference has not been resolved yet
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Id(_) => None,
        }
    }

    /// The id, if this reference is already resolved
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Key(_) => None,
        }
    }

    /// Raw value regardless of whether it is a key or an id
    pub fn value(&self) -> &str {
        match self {
            Self::Key(value) | Self::Id(value) => value,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Id(_))
    }
}

/// Key-to-id mappings available to one draft during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    ids: HashMap<(ReferenceType, String), String>,
}

impl ResolvedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        reference_type: ReferenceType,
        key: impl Into<String>,
        id: impl Into<String>,
    ) {
        self.ids.insert((reference_type, key.into()), id.into());
    }

    pub fn id_of(&self, reference_type: ReferenceType, key: &str) -> Option<&str> {
        self.ids
            .get(&(reference_type, key.to_string()))
            .map(String::as_str)
    }

    /// Turn a key reference into an id reference when a mapping is known.
    ///
    /// Id references and unknown keys are returned unchanged.
    pub fn resolve(&self, reference_type: ReferenceType, reference: &ResourceRef) -> ResourceRef {
        match reference {
            ResourceRef::Key(key) => self
                .id_of(reference_type, key)
                .map(ResourceRef::id)
                .unwrap_or_else(|| reference.clone()),
            ResourceRef::Id(_) => reference.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Remote lookup and creation of referenced resources.
///
/// Implementations issue one request per call; batching several keys into a
/// single call is the caller's job.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::reference::{ReferenceStore, ReferenceType};
///
/// async fn channel_ids(store: &dyn ReferenceStore, keys: &HashSet<String>) -> Result<()> {
///     let ids = store.fetch_ids_by_keys(ReferenceType::CHANNEL, keys).await?;
///     println!("resolved {} of {} channels", ids.len(), keys.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Fetch the ids of every resource of `reference_type` whose key is in `keys`.
    ///
    /// Keys without a matching resource are simply absent from the result.
    async fn fetch_ids_by_keys(
        &self,
        reference_type: ReferenceType,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, String>>;

    /// Create a resource of `reference_type` with the given key and return its id.
    ///
    /// Only called when ensure mode is enabled.
    async fn create_referenced(&self, reference_type: ReferenceType, key: &str) -> Result<String>;
}
