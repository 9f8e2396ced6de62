//! # Inventory Resource
//!
//! Adapts inventory entries to the generic sync engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - Inventory entry drafts, entries and update actions (`model`)
//! - Identity and reference rules: entries are matched by sku and supply
//!   channel, and reference a supply channel and a custom type (`resource`)
//! - Field-by-field update actions (`differ`)
//! - [`inventory_sync`], which wires them into a [`SyncOrchestrator`]
//!
//! In ensure mode, missing supply channels are created on demand. Custom
//! types are never created; a draft referencing an unknown type fails.

pub mod differ;
pub mod model;
pub mod resource;

use std::sync::Arc;

use bridge_traits::{ReferenceStore, RemoteStore};
use core_sync::{SyncOptions, SyncOrchestrator};
use tracing::debug;

pub use differ::InventoryDiffer;
pub use model::{
    CustomFieldValues, CustomFields, CustomFieldsDraft, InventoryAction, InventoryEntry,
    InventoryEntryDraft, InventoryIdentifier,
};
pub use resource::InventoryResource;

/// Orchestrator for inventory entries
pub type InventorySync = SyncOrchestrator<InventoryResource>;

/// Options for [`InventorySync`]
pub type InventorySyncOptions = SyncOptions<InventoryResource>;

/// Build an [`InventorySync`] using [`InventoryDiffer`]
///
/// # Errors
///
/// Returns [`core_sync::SyncError::InvalidConfig`] if the identifier cache
/// cannot be sized from `options`.
pub fn inventory_sync(
    options: InventorySyncOptions,
    store: Arc<dyn RemoteStore<InventoryResource>>,
    references: Arc<dyn ReferenceStore>,
) -> core_sync::Result<InventorySync> {
    debug!(
        ensure_channels = options.ensure_referenced_entities(),
        batch_size = options.batch_size(),
        "Creating inventory sync"
    );
    SyncOrchestrator::new(options, store, references, Arc::new(InventoryDiffer))
}
