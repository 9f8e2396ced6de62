//! Resource Adapter Contract
//!
//! A [`SyncResource`] describes one resource type (inventory entries,
//! customers, ...) to the generic sync engine: which value types it uses,
//! how a draft and an entity are joined, and which references a draft
//! carries. The engine never looks inside drafts or entities beyond what this
//! trait exposes.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::reference::{ReferenceType, ResolvedReferences, ResourceRef};

/// Describes a resource type to the sync engine.
///
/// Implementors are usually zero-sized marker types; every method is an
/// associated function over the draft and entity values.
///
/// # Example
///
/// ```ignore
/// pub struct CustomerResource;
///
/// impl SyncResource for CustomerResource {
///     type Draft = CustomerDraft;
///     type Entity = Customer;
///     type Identifier = String;
///     type Action = CustomerAction;
///
///     const RESOURCE_NAME: &'static str = "customers";
///
///     fn draft_identifier(draft: &CustomerDraft) -> Option<String> {
///         Some(draft.key.clone()).filter(|key| !key.trim().is_empty())
///     }
///     // ...
/// }
/// ```
pub trait SyncResource: Send + Sync + 'static {
    /// Caller-supplied desired state
    type Draft: Clone + Debug + Send + Sync + 'static;
    /// Current remote state
    type Entity: Clone + Debug + Send + Sync + 'static;
    /// Join key between drafts and entities within one batch
    type Identifier: Clone + Debug + Display + Eq + Hash + Send + Sync + 'static;
    /// A single update operation understood by the remote store
    type Action: Clone + Debug + Send + Sync + 'static;

    /// Plural name used in logs and reports (e.g. "inventory entries")
    const RESOURCE_NAME: &'static str;

    /// Business identifier of a draft, or `None` when it is blank or missing
    fn draft_identifier(draft: &Self::Draft) -> Option<Self::Identifier>;

    /// Business identifier of an existing entity
    fn entity_identifier(entity: &Self::Entity) -> Self::Identifier;

    /// Server-assigned id of an existing entity
    fn entity_id(entity: &Self::Entity) -> &str;

    /// Optimistic-concurrency version of an existing entity
    fn entity_version(entity: &Self::Entity) -> u64;

    /// Check the fields the differ needs beyond the identifier.
    ///
    /// Returns a message naming the violated rule.
    fn check_required_fields(_draft: &Self::Draft) -> Result<(), String> {
        Ok(())
    }

    /// Every reference the draft carries, key-based or already id-based
    fn references(draft: &Self::Draft) -> Vec<(ReferenceType, ResourceRef)>;

    /// Rewrite the draft's key references into id references
    fn apply_resolved(draft: Self::Draft, resolved: &ResolvedReferences) -> Self::Draft;

    /// Whether ensure mode may create a missing referenced entity of this type
    fn can_create_reference(_reference_type: ReferenceType) -> bool {
        true
    }

    /// Reference type and key under which other drafts refer to this entity.
    ///
    /// When present, the engine records the entity's id in its identifier
    /// cache after fetching or creating it.
    fn self_reference(_entity: &Self::Entity) -> Option<(ReferenceType, String)> {
        None
    }
}
