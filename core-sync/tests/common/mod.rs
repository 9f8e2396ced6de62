//! Shared fixtures: a small customer resource and in-memory remote stores.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    BridgeError, IdOrKey, ReferenceStore, ReferenceType, RemoteStore, ResolvedReferences,
    ResourceRef, Result, SyncResource,
};
use core_async::sync::Mutex as AsyncMutex;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_sync::{Differ, SyncError, SyncOptionsBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GROUP: ReferenceType = ReferenceType::CUSTOMER_GROUP;

// ============================================================================
// Customer Resource
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub key: String,
    pub name: String,
    pub group: Option<ResourceRef>,
}

impl CustomerDraft {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            group: None,
        }
    }

    pub fn in_group(mut self, group_key: &str) -> Self {
        self.group = Some(ResourceRef::key(group_key));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub key: String,
    pub version: u64,
    pub name: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerAction {
    ChangeName(String),
    SetCustomerGroup(Option<String>),
}

pub struct CustomerResource;

impl SyncResource for CustomerResource {
    type Draft = CustomerDraft;
    type Entity = Customer;
    type Identifier = String;
    type Action = CustomerAction;

    const RESOURCE_NAME: &'static str = "customers";

    fn draft_identifier(draft: &CustomerDraft) -> Option<String> {
        Some(draft.key.clone()).filter(|key| !key.trim().is_empty())
    }

    fn entity_identifier(entity: &Customer) -> String {
        entity.key.clone()
    }

    fn entity_id(entity: &Customer) -> &str {
        &entity.id
    }

    fn entity_version(entity: &Customer) -> u64 {
        entity.version
    }

    fn check_required_fields(draft: &CustomerDraft) -> std::result::Result<(), String> {
        if draft.name.trim().is_empty() {
            return Err(format!("Customer '{}' has no name.", draft.key));
        }
        Ok(())
    }

    fn references(draft: &CustomerDraft) -> Vec<(ReferenceType, ResourceRef)> {
        draft.group.iter().map(|group| (GROUP, group.clone())).collect()
    }

    fn apply_resolved(mut draft: CustomerDraft, resolved: &ResolvedReferences) -> CustomerDraft {
        draft.group = draft.group.map(|group| resolved.resolve(GROUP, &group));
        draft
    }
}

pub struct CustomerDiffer;

impl Differ<CustomerResource> for CustomerDiffer {
    fn diff(&self, existing: &Customer, draft: &CustomerDraft) -> Vec<CustomerAction> {
        let mut actions = Vec::new();
        if existing.name != draft.name {
            actions.push(CustomerAction::ChangeName(draft.name.clone()));
        }
        let group_id = draft
            .group
            .as_ref()
            .and_then(ResourceRef::as_id)
            .map(str::to_string);
        if existing.group_id != group_id {
            actions.push(CustomerAction::SetCustomerGroup(group_id));
        }
        actions
    }
}

// ============================================================================
// In-memory Customer Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryCustomers {
    customers: AsyncMutex<HashMap<String, Customer>>,
    next_id: AtomicUsize,
    conflicts: AsyncMutex<HashMap<String, usize>>,
    deleted_on_conflict: AsyncMutex<HashSet<String>>,
    renamed_on_conflict: AsyncMutex<HashMap<String, String>>,
    failing_creates: AsyncMutex<HashSet<String>>,
    fail_fetch: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub refetch_calls: AtomicUsize,
}

impl InMemoryCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: &str, name: &str) -> Customer {
        let id = format!("cust-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let customer = Customer {
            id,
            key: key.to_string(),
            version: 1,
            name: name.to_string(),
            group_id: None,
        };
        self.customers
            .lock()
            .await
            .insert(key.to_string(), customer.clone());
        customer
    }

    pub async fn get(&self, key: &str) -> Option<Customer> {
        self.customers.lock().await.get(key).cloned()
    }

    /// The next `times` updates of `key` fail with a conflict after a
    /// simulated concurrent modification
    pub async fn conflict_on_update(&self, key: &str, times: usize) {
        self.conflicts.lock().await.insert(key.to_string(), times);
    }

    /// The next conflicting update of `key` also deletes the customer
    pub async fn delete_on_conflict(&self, key: &str) {
        self.deleted_on_conflict.lock().await.insert(key.to_string());
    }

    /// The next conflicting update of `key` comes from a writer that renamed
    /// the customer to `name`
    pub async fn rename_on_conflict(&self, key: &str, name: &str) {
        self.renamed_on_conflict
            .lock()
            .await
            .insert(key.to_string(), name.to_string());
    }

    pub async fn fail_create(&self, key: &str) {
        self.failing_creates.lock().await.insert(key.to_string());
    }

    pub fn fail_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore<CustomerResource> for InMemoryCustomers {
    async fn fetch_by_identifiers(&self, identifiers: &HashSet<String>) -> Result<Vec<Customer>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(BridgeError::Remote("503 Service Unavailable".to_string()));
        }

        let customers = self.customers.lock().await;
        Ok(identifiers
            .iter()
            .filter_map(|key| customers.get(key).cloned())
            .collect())
    }

    async fn create(&self, draft: &CustomerDraft) -> Result<Customer> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_creates.lock().await.contains(&draft.key) {
            return Err(BridgeError::Remote(format!("400 Bad Request for {}", draft.key)));
        }

        let customer = Customer {
            id: format!("cust-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            key: draft.key.clone(),
            version: 1,
            name: draft.name.clone(),
            group_id: draft.group.as_ref().and_then(ResourceRef::as_id).map(str::to_string),
        };
        self.customers
            .lock()
            .await
            .insert(draft.key.clone(), customer.clone());
        Ok(customer)
    }

    async fn update(&self, entity: &Customer, actions: &[CustomerAction]) -> Result<Customer> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut customers = self.customers.lock().await;

        let mut conflicts = self.conflicts.lock().await;
        if let Some(remaining) = conflicts.get_mut(&entity.key).filter(|n| **n > 0) {
            *remaining -= 1;
            if self.deleted_on_conflict.lock().await.remove(&entity.key) {
                customers.remove(&entity.key);
            } else if let Some(stored) = customers.get_mut(&entity.key) {
                stored.version += 1;
                if let Some(name) = self.renamed_on_conflict.lock().await.remove(&entity.key) {
                    stored.name = name;
                }
            }
            return Err(BridgeError::Conflict {
                id: entity.id.clone(),
                message: format!("version {} is outdated", entity.version),
            });
        }

        let stored = customers
            .get_mut(&entity.key)
            .ok_or_else(|| BridgeError::NotFound(entity.id.clone()))?;
        if stored.version != entity.version {
            return Err(BridgeError::Conflict {
                id: entity.id.clone(),
                message: format!("expected version {} but was {}", stored.version, entity.version),
            });
        }

        for action in actions {
            match action {
                CustomerAction::ChangeName(name) => stored.name = name.clone(),
                CustomerAction::SetCustomerGroup(group_id) => stored.group_id = group_id.clone(),
            }
        }
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn fetch_by_id_or_key(&self, id_or_key: &IdOrKey) -> Result<Option<Customer>> {
        self.refetch_calls.fetch_add(1, Ordering::SeqCst);
        let customers = self.customers.lock().await;
        Ok(match id_or_key {
            IdOrKey::Id(id) => customers.values().find(|c| &c.id == id).cloned(),
            IdOrKey::Key(key) => customers.get(key).cloned(),
        })
    }
}

// ============================================================================
// In-memory Customer Groups
// ============================================================================

#[derive(Default)]
pub struct InMemoryGroups {
    ids: AsyncMutex<HashMap<String, String>>,
    fail_fetch: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub fetched_keys: AsyncMutex<Vec<HashSet<String>>>,
    pub created: AsyncMutex<Vec<String>>,
}

impl InMemoryGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_group(self, key: &str, id: &str) -> Self {
        self.ids.lock().await.insert(key.to_string(), id.to_string());
        self
    }

    pub fn fail_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReferenceStore for InMemoryGroups {
    async fn fetch_ids_by_keys(
        &self,
        reference_type: ReferenceType,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, String>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_keys.lock().await.push(keys.clone());
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(BridgeError::Remote("timeout".to_string()));
        }
        if reference_type != GROUP {
            return Ok(HashMap::new());
        }

        let ids = self.ids.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| ids.get(key).map(|id| (key.clone(), id.clone())))
            .collect())
    }

    async fn create_referenced(&self, reference_type: ReferenceType, key: &str) -> Result<String> {
        if reference_type != GROUP {
            return Err(BridgeError::NotAvailable(reference_type.to_string()));
        }
        let id = format!("group-{}", key);
        self.ids.lock().await.insert(key.to_string(), id.clone());
        self.created.lock().await.push(key.to_string());
        Ok(id)
    }
}

/// Install a compact subscriber once per test binary; later calls are no-ops
pub fn init_test_logging() {
    let config = LoggingConfig::from_env()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Info);
    let _ = init_logging(config);
}

// ============================================================================
// Callback Recording
// ============================================================================

/// Messages received by the error and warning callbacks
#[derive(Clone, Default)]
pub struct Recorded {
    pub errors: Arc<Mutex<Vec<String>>>,
    pub warnings: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

/// Attach recording callbacks to `builder`
pub fn recording(
    builder: SyncOptionsBuilder<CustomerResource>,
) -> (SyncOptionsBuilder<CustomerResource>, Recorded) {
    let recorded = Recorded::default();
    let errors = Arc::clone(&recorded.errors);
    let warnings = Arc::clone(&recorded.warnings);

    let builder = builder
        .error_callback(move |err: &SyncError, _, _, _| {
            errors.lock().unwrap().push(err.to_string())
        })
        .warning_callback(move |warning: &SyncError, _, _| {
            warnings.lock().unwrap().push(warning.to_string())
        });

    (builder, recorded)
}
