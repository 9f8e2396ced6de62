//! Inventory sync demonstration
//!
//! Runs two sync passes against in-memory stores and prints the reports.
//!
//! Run with:
//! ```bash
//! cargo run -p resource-inventory --example inventory_sync_demo
//!
//! # JSON logs with engine internals
//! cargo run -p resource-inventory --example inventory_sync_demo -- json "core_sync=debug"
//! ```

use async_trait::async_trait;
use bridge_traits::{
    BridgeError, IdOrKey, ReferenceStore, ReferenceType, RemoteStore, ResourceRef, Result,
};
use core_async::sync::Mutex;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_sync::SyncSettings;
use resource_inventory::{
    inventory_sync, InventoryAction, InventoryEntry, InventoryEntryDraft, InventoryIdentifier,
    InventoryResource, InventorySyncOptions,
};
use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
struct Warehouse {
    entries: Mutex<HashMap<String, InventoryEntry>>,
}

#[async_trait]
impl RemoteStore<InventoryResource> for Warehouse {
    async fn fetch_by_identifiers(
        &self,
        identifiers: &HashSet<InventoryIdentifier>,
    ) -> Result<Vec<InventoryEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|e| {
                identifiers.contains(&InventoryIdentifier::new(
                    e.sku.as_str(),
                    e.supply_channel_id.clone(),
                ))
            })
            .cloned()
            .collect())
    }

    async fn create(&self, draft: &InventoryEntryDraft) -> Result<InventoryEntry> {
        let mut entries = self.entries.lock().await;
        let entry = InventoryEntry {
            id: format!("inv-{}", entries.len() + 1),
            version: 1,
            sku: draft.sku.clone(),
            quantity_on_stock: draft.quantity_on_stock,
            restockable_in_days: draft.restockable_in_days,
            expected_delivery: draft.expected_delivery,
            supply_channel_id: draft
                .supply_channel
                .as_ref()
                .and_then(ResourceRef::as_id)
                .map(str::to_string),
            custom: None,
        };
        entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        entity: &InventoryEntry,
        actions: &[InventoryAction],
    ) -> Result<InventoryEntry> {
        let mut entries = self.entries.lock().await;
        let stored = entries
            .get_mut(&entity.id)
            .ok_or_else(|| BridgeError::NotFound(entity.id.clone()))?;
        for action in actions {
            match action {
                InventoryAction::ChangeQuantity { quantity } => stored.quantity_on_stock = *quantity,
                InventoryAction::SetRestockableInDays { restockable_in_days } => {
                    stored.restockable_in_days = *restockable_in_days
                }
                other => info!(?other, "Ignoring action"),
            }
        }
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn fetch_by_id_or_key(&self, id_or_key: &IdOrKey) -> Result<Option<InventoryEntry>> {
        let entries = self.entries.lock().await;
        Ok(match id_or_key {
            IdOrKey::Id(id) => entries.get(id).cloned(),
            IdOrKey::Key(_) => None,
        })
    }
}

#[derive(Default)]
struct Channels {
    ids: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl ReferenceStore for Channels {
    async fn fetch_ids_by_keys(
        &self,
        reference_type: ReferenceType,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, String>> {
        if reference_type != ReferenceType::CHANNEL {
            return Ok(HashMap::new());
        }
        let ids = self.ids.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| ids.get(key).map(|id| (key.clone(), id.clone())))
            .collect())
    }

    async fn create_referenced(&self, reference_type: ReferenceType, key: &str) -> Result<String> {
        let id = format!("{}-{}", reference_type, key);
        self.ids.lock().await.insert(key.to_string(), id.clone());
        Ok(id)
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let mut config = LoggingConfig::from_env().with_format(format);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.as_str());
    }
    init_logging(config)?;

    let settings: SyncSettings =
        serde_json::from_str(r#"{"batch_size": 2, "ensure_referenced_entities": true}"#)?;
    let options = InventorySyncOptions::builder()
        .batch_size(settings.batch_size)
        .ensure_referenced_entities(settings.ensure_referenced_entities)
        .error_callback(|err, _, _, _| eprintln!("sync error: {}", err))
        .build()?;

    let sync = inventory_sync(
        options,
        Arc::new(Warehouse::default()),
        Arc::new(Channels::default()),
    )?;

    let drafts = vec![
        InventoryEntryDraft::new("sku-red-shirt", 12)
            .with_supply_channel(ResourceRef::key("berlin")),
        InventoryEntryDraft::new("sku-blue-shirt", 3).with_restockable_in_days(5),
        InventoryEntryDraft::new("sku-green-shirt", -1),
    ];

    let first = sync.process_drafts(drafts).await;
    info!("First pass: {}", first.report_message());

    let restock = vec![InventoryEntryDraft::new("sku-blue-shirt", 40).with_restockable_in_days(5)];
    let second = sync.process_drafts(restock).await;
    info!("Second pass: {}", second.report_message());

    println!("{}", serde_json::to_string_pretty(&second)?);
    Ok(())
}
