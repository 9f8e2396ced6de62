//! # Remote Bridge Traits
//!
//! Collaborator traits that must be implemented by whoever hosts the sync
//! engine against a concrete remote API.
//!
//! ## Overview
//!
//! This crate defines the contract between the generic sync engine and the
//! resource-specific world around it. The engine never speaks HTTP or knows a
//! resource schema; it only calls these traits.
//!
//! ## Traits
//!
//! - [`SyncResource`](resource::SyncResource) - Value types and identity rules of one resource type
//! - [`RemoteStore`](remote::RemoteStore) - Batched fetch, create, update and point lookup of entities
//! - [`ReferenceStore`](reference::ReferenceStore) - Key-to-id lookup and creation of referenced resources
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should:
//!
//! - Report version mismatches as `BridgeError::Conflict`, never as a generic failure
//! - Report missing entities through `Ok(None)` on point lookups rather than `NotFound`
//! - Include the offending id or key in error messages
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds; the engine calls them from
//! concurrently running per-draft tasks.

pub mod error;
pub mod reference;
pub mod remote;
pub mod resource;

pub use error::{BridgeError, Result};

pub use reference::{ReferenceStore, ReferenceType, ResolvedReferences, ResourceRef};
pub use remote::{IdOrKey, RemoteStore};
pub use resource::SyncResource;
