//! Update actions for inventory entries
//!
//! Compares a resolved draft with the stored entry field by field. Custom
//! fields follow the usual rules: a changed type replaces all fields at once,
//! an unchanged type yields one action per added, changed or removed field.

use bridge_traits::ResourceRef;
use core_sync::Differ;

use crate::model::{
    CustomFields, CustomFieldsDraft, InventoryAction, InventoryEntry, InventoryEntryDraft,
};
use crate::resource::InventoryResource;

#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryDiffer;

impl Differ<InventoryResource> for InventoryDiffer {
    fn diff(&self, existing: &InventoryEntry, draft: &InventoryEntryDraft) -> Vec<InventoryAction> {
        let mut actions = Vec::new();

        if existing.quantity_on_stock != draft.quantity_on_stock {
            actions.push(InventoryAction::ChangeQuantity {
                quantity: draft.quantity_on_stock,
            });
        }
        if existing.restockable_in_days != draft.restockable_in_days {
            actions.push(InventoryAction::SetRestockableInDays {
                restockable_in_days: draft.restockable_in_days,
            });
        }
        if existing.expected_delivery != draft.expected_delivery {
            actions.push(InventoryAction::SetExpectedDelivery {
                expected_delivery: draft.expected_delivery,
            });
        }

        let channel_id = draft
            .supply_channel
            .as_ref()
            .and_then(ResourceRef::as_id)
            .map(str::to_string);
        if existing.supply_channel_id != channel_id {
            actions.push(InventoryAction::SetSupplyChannel {
                supply_channel_id: channel_id,
            });
        }

        actions.extend(custom_actions(existing.custom.as_ref(), draft.custom.as_ref()));
        actions
    }
}

fn custom_actions(
    existing: Option<&CustomFields>,
    draft: Option<&CustomFieldsDraft>,
) -> Vec<InventoryAction> {
    match (existing, draft) {
        (None, None) => Vec::new(),
        (Some(_), None) => vec![InventoryAction::SetCustomType {
            type_id: None,
            fields: Default::default(),
        }],
        (None, Some(draft)) => vec![InventoryAction::SetCustomType {
            type_id: draft.type_ref.as_id().map(str::to_string),
            fields: draft.fields.clone(),
        }],
        (Some(existing), Some(draft)) => {
            if draft.type_ref.as_id() != Some(existing.type_id.as_str()) {
                return vec![InventoryAction::SetCustomType {
                    type_id: draft.type_ref.as_id().map(str::to_string),
                    fields: draft.fields.clone(),
                }];
            }

            let changed = draft
                .fields
                .iter()
                .filter(|(name, value)| existing.fields.get(*name) != Some(*value))
                .map(|(name, value)| InventoryAction::SetCustomField {
                    name: name.clone(),
                    value: Some(value.clone()),
                });
            let removed = existing
                .fields
                .keys()
                .filter(|name| !draft.fields.contains_key(*name))
                .map(|name| InventoryAction::SetCustomField {
                    name: name.clone(),
                    value: None,
                });
            changed.chain(removed).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomFieldValues;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn entry() -> InventoryEntry {
        InventoryEntry {
            id: "inv-1".to_string(),
            version: 1,
            sku: "sku-1".to_string(),
            quantity_on_stock: 10,
            restockable_in_days: None,
            expected_delivery: None,
            supply_channel_id: Some("ch-1".to_string()),
            custom: None,
        }
    }

    fn draft() -> InventoryEntryDraft {
        InventoryEntryDraft::new("sku-1", 10).with_supply_channel(ResourceRef::id("ch-1"))
    }

    fn fields(pairs: &[(&str, serde_json::Value)]) -> CustomFieldValues {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_identical_entry_needs_no_actions() {
        assert!(InventoryDiffer.diff(&entry(), &draft()).is_empty());
    }

    #[test]
    fn test_scalar_fields() {
        let delivery = Utc.with_ymd_and_hms(2026, 11, 2, 9, 0, 0).unwrap();
        let draft = InventoryEntryDraft {
            quantity_on_stock: 4,
            ..draft()
        }
        .with_restockable_in_days(3)
        .with_expected_delivery(delivery);

        assert_eq!(
            InventoryDiffer.diff(&entry(), &draft),
            vec![
                InventoryAction::ChangeQuantity { quantity: 4 },
                InventoryAction::SetRestockableInDays {
                    restockable_in_days: Some(3)
                },
                InventoryAction::SetExpectedDelivery {
                    expected_delivery: Some(delivery)
                },
            ]
        );
    }

    #[test]
    fn test_custom_type_added_and_removed() {
        let with_custom = draft().with_custom(ResourceRef::id("type-1"), fields(&[("shelf", json!("A3"))]));
        assert_eq!(
            InventoryDiffer.diff(&entry(), &with_custom),
            vec![InventoryAction::SetCustomType {
                type_id: Some("type-1".to_string()),
                fields: fields(&[("shelf", json!("A3"))]),
            }]
        );

        let mut existing = entry();
        existing.custom = Some(CustomFields {
            type_id: "type-1".to_string(),
            fields: CustomFieldValues::new(),
        });
        assert_eq!(
            InventoryDiffer.diff(&existing, &draft()),
            vec![InventoryAction::SetCustomType {
                type_id: None,
                fields: CustomFieldValues::new(),
            }]
        );
    }

    #[test]
    fn test_custom_fields_same_type() {
        let mut existing = entry();
        existing.custom = Some(CustomFields {
            type_id: "type-1".to_string(),
            fields: fields(&[("shelf", json!("A3")), ("aisle", json!(4)), ("bin", json!("x"))]),
        });
        let draft = draft().with_custom(
            ResourceRef::id("type-1"),
            fields(&[("shelf", json!("B1")), ("aisle", json!(4)), ("label", json!(true))]),
        );

        let actions = InventoryDiffer.diff(&existing, &draft);
        assert_eq!(actions.len(), 3);
        assert!(actions.contains(&InventoryAction::SetCustomField {
            name: "shelf".to_string(),
            value: Some(json!("B1")),
        }));
        assert!(actions.contains(&InventoryAction::SetCustomField {
            name: "label".to_string(),
            value: Some(json!(true)),
        }));
        assert!(actions.contains(&InventoryAction::SetCustomField {
            name: "bin".to_string(),
            value: None,
        }));
    }

    #[test]
    fn test_custom_type_change_replaces_fields() {
        let mut existing = entry();
        existing.custom = Some(CustomFields {
            type_id: "type-1".to_string(),
            fields: fields(&[("shelf", json!("A3"))]),
        });
        let draft = draft().with_custom(ResourceRef::id("type-2"), fields(&[("zone", json!("cold"))]));

        assert_eq!(
            InventoryDiffer.diff(&existing, &draft),
            vec![InventoryAction::SetCustomType {
                type_id: Some("type-2".to_string()),
                fields: fields(&[("zone", json!("cold"))]),
            }]
        );
    }
}
