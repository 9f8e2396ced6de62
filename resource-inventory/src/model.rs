//! Inventory entry types
//!
//! Drafts, entities and update actions in the shape of a commerce platform's
//! inventory API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use bridge_traits::ResourceRef;

/// Custom field values keyed by field name
pub type CustomFieldValues = BTreeMap<String, Value>;

/// Desired custom type and values of a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldsDraft {
    #[serde(rename = "type")]
    pub type_ref: ResourceRef,
    #[serde(default)]
    pub fields: CustomFieldValues,
}

/// Custom type and values stored on an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFields {
    pub type_id: String,
    #[serde(default)]
    pub fields: CustomFieldValues,
}

/// Desired state of one inventory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntryDraft {
    pub sku: String,
    pub quantity_on_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restockable_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_channel: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFieldsDraft>,
}

impl InventoryEntryDraft {
    pub fn new(sku: impl Into<String>, quantity_on_stock: i64) -> Self {
        Self {
            sku: sku.into(),
            quantity_on_stock,
            restockable_in_days: None,
            expected_delivery: None,
            supply_channel: None,
            custom: None,
        }
    }

    pub fn with_supply_channel(mut self, channel: ResourceRef) -> Self {
        self.supply_channel = Some(channel);
        self
    }

    pub fn with_restockable_in_days(mut self, days: u32) -> Self {
        self.restockable_in_days = Some(days);
        self
    }

    pub fn with_expected_delivery(mut self, delivery: DateTime<Utc>) -> Self {
        self.expected_delivery = Some(delivery);
        self
    }

    pub fn with_custom(mut self, type_ref: ResourceRef, fields: CustomFieldValues) -> Self {
        self.custom = Some(CustomFieldsDraft { type_ref, fields });
        self
    }
}

/// Inventory entry as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: String,
    pub version: u64,
    pub sku: String,
    pub quantity_on_stock: i64,
    #[serde(default)]
    pub restockable_in_days: Option<u32>,
    #[serde(default)]
    pub expected_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub supply_channel_id: Option<String>,
    #[serde(default)]
    pub custom: Option<CustomFields>,
}

/// Join key of inventory drafts and entries: sku plus supply channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryIdentifier {
    pub sku: String,
    /// Channel key before resolution, channel id after
    pub supply_channel: Option<String>,
}

impl InventoryIdentifier {
    pub fn new(sku: impl Into<String>, supply_channel: Option<String>) -> Self {
        Self {
            sku: sku.into(),
            supply_channel,
        }
    }
}

impl fmt::Display for InventoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.supply_channel {
            Some(channel) => write!(f, "{}@{}", self.sku, channel),
            None => f.write_str(&self.sku),
        }
    }
}

/// Update action on an inventory entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InventoryAction {
    #[serde(rename_all = "camelCase")]
    ChangeQuantity { quantity: i64 },
    #[serde(rename_all = "camelCase")]
    SetRestockableInDays { restockable_in_days: Option<u32> },
    #[serde(rename_all = "camelCase")]
    SetExpectedDelivery { expected_delivery: Option<DateTime<Utc>> },
    #[serde(rename_all = "camelCase")]
    SetSupplyChannel { supply_channel_id: Option<String> },
    /// Replace the custom type; `None` removes custom fields entirely
    #[serde(rename_all = "camelCase")]
    SetCustomType {
        type_id: Option<String>,
        fields: CustomFieldValues,
    },
    /// Set one custom field; `None` removes it
    SetCustomField { name: String, value: Option<Value> },
}
