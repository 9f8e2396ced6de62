//! [`SyncResource`] implementation for inventory entries
//!
//! # Channel identity
//!
//! An entry is identified by its sku and the raw supply channel value. Before
//! resolution that value is a channel key, afterwards a channel id. Duplicate
//! detection runs before resolution, so a batch must name each channel the
//! same way in every draft. Mixing `ResourceRef::Key("berlin")` and the id of
//! the same channel for one sku is a caller error: both drafts pass duplicate
//! detection and are reconciled concurrently against the same entry.

use bridge_traits::{ReferenceType, ResolvedReferences, ResourceRef, SyncResource};

use crate::model::{InventoryAction, InventoryEntry, InventoryEntryDraft, InventoryIdentifier};

pub struct InventoryResource;

impl SyncResource for InventoryResource {
    type Draft = InventoryEntryDraft;
    type Entity = InventoryEntry;
    type Identifier = InventoryIdentifier;
    type Action = InventoryAction;

    const RESOURCE_NAME: &'static str = "inventory entries";

    /// Sku plus the raw channel value, key or id as the draft carries it
    fn draft_identifier(draft: &InventoryEntryDraft) -> Option<InventoryIdentifier> {
        if draft.sku.trim().is_empty() {
            return None;
        }
        Some(InventoryIdentifier::new(
            draft.sku.as_str(),
            draft
                .supply_channel
                .as_ref()
                .map(|channel| channel.value().to_string()),
        ))
    }

    fn entity_identifier(entity: &InventoryEntry) -> InventoryIdentifier {
        InventoryIdentifier::new(entity.sku.as_str(), entity.supply_channel_id.clone())
    }

    fn entity_id(entity: &InventoryEntry) -> &str {
        &entity.id
    }

    fn entity_version(entity: &InventoryEntry) -> u64 {
        entity.version
    }

    fn check_required_fields(draft: &InventoryEntryDraft) -> Result<(), String> {
        if draft.quantity_on_stock < 0 {
            return Err(format!(
                "Inventory entry draft with sku '{}' has a negative quantity on stock ({}).",
                draft.sku, draft.quantity_on_stock
            ));
        }
        Ok(())
    }

    fn references(draft: &InventoryEntryDraft) -> Vec<(ReferenceType, ResourceRef)> {
        let mut references = Vec::with_capacity(2);
        if let Some(channel) = &draft.supply_channel {
            references.push((ReferenceType::CHANNEL, channel.clone()));
        }
        if let Some(custom) = &draft.custom {
            references.push((ReferenceType::TYPE, custom.type_ref.clone()));
        }
        references
    }

    fn apply_resolved(
        mut draft: InventoryEntryDraft,
        resolved: &ResolvedReferences,
    ) -> InventoryEntryDraft {
        draft.supply_channel = draft
            .supply_channel
            .map(|channel| resolved.resolve(ReferenceType::CHANNEL, &channel));
        if let Some(custom) = draft.custom.as_mut() {
            custom.type_ref = resolved.resolve(ReferenceType::TYPE, &custom.type_ref);
        }
        draft
    }

    /// Only supply channels are created on demand; custom types must exist
    fn can_create_reference(reference_type: ReferenceType) -> bool {
        reference_type == ReferenceType::CHANNEL
    }
}
