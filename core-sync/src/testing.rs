//! Widget resource used by the unit tests of this crate.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bridge_traits::{
    IdOrKey, ReferenceStore, ReferenceType, RemoteStore, ResolvedReferences, ResourceRef,
    Result as BridgeResult, SyncResource,
};
use mockall::mock;

use crate::differ::Differ;

pub const WIDGET: ReferenceType = ReferenceType::new("widget");
pub const CATEGORY: ReferenceType = ReferenceType::new("category");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetDraft {
    pub key: String,
    pub size: i64,
    pub category: Option<ResourceRef>,
}

impl WidgetDraft {
    pub fn new(key: &str, size: i64) -> Self {
        Self {
            key: key.to_string(),
            size,
            category: None,
        }
    }

    pub fn with_category(mut self, key: &str) -> Self {
        self.category = Some(ResourceRef::key(key));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub id: String,
    pub key: String,
    pub version: u64,
    pub size: i64,
    pub category_id: Option<String>,
}

impl Widget {
    pub fn new(id: &str, key: &str, version: u64, size: i64) -> Self {
        Self {
            id: id.to_string(),
            key: key.to_string(),
            version,
            size,
            category_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetAction {
    SetSize(i64),
    SetCategory(Option<String>),
}

pub struct WidgetResource;

impl SyncResource for WidgetResource {
    type Draft = WidgetDraft;
    type Entity = Widget;
    type Identifier = String;
    type Action = WidgetAction;

    const RESOURCE_NAME: &'static str = "widgets";

    fn draft_identifier(draft: &WidgetDraft) -> Option<String> {
        Some(draft.key.clone()).filter(|key| !key.trim().is_empty())
    }

    fn entity_identifier(entity: &Widget) -> String {
        entity.key.clone()
    }

    fn entity_id(entity: &Widget) -> &str {
        &entity.id
    }

    fn entity_version(entity: &Widget) -> u64 {
        entity.version
    }

    fn check_required_fields(draft: &WidgetDraft) -> Result<(), String> {
        if draft.size < 0 {
            return Err(format!("Widget '{}' has a negative size.", draft.key));
        }
        Ok(())
    }

    fn references(draft: &WidgetDraft) -> Vec<(ReferenceType, ResourceRef)> {
        draft
            .category
            .iter()
            .map(|category| (CATEGORY, category.clone()))
            .collect()
    }

    fn apply_resolved(mut draft: WidgetDraft, resolved: &ResolvedReferences) -> WidgetDraft {
        draft.category = draft
            .category
            .map(|category| resolved.resolve(CATEGORY, &category));
        draft
    }

    fn self_reference(entity: &Widget) -> Option<(ReferenceType, String)> {
        Some((WIDGET, entity.key.clone()))
    }
}

pub struct WidgetDiffer;

impl Differ<WidgetResource> for WidgetDiffer {
    fn diff(&self, existing: &Widget, draft: &WidgetDraft) -> Vec<WidgetAction> {
        let mut actions = Vec::new();
        if existing.size != draft.size {
            actions.push(WidgetAction::SetSize(draft.size));
        }
        let category = draft
            .category
            .as_ref()
            .and_then(|c| c.as_id())
            .map(str::to_string);
        if existing.category_id != category {
            actions.push(WidgetAction::SetCategory(category));
        }
        actions
    }
}

mock! {
    pub Store {}

    #[async_trait]
    impl RemoteStore<WidgetResource> for Store {
        async fn fetch_by_identifiers(&self, identifiers: &HashSet<String>) -> BridgeResult<Vec<Widget>>;
        async fn create(&self, draft: &WidgetDraft) -> BridgeResult<Widget>;
        async fn update(&self, entity: &Widget, actions: &[WidgetAction]) -> BridgeResult<Widget>;
        async fn fetch_by_id_or_key(&self, id_or_key: &IdOrKey) -> BridgeResult<Option<Widget>>;
    }
}

mock! {
    pub References {}

    #[async_trait]
    impl ReferenceStore for References {
        async fn fetch_ids_by_keys(
            &self,
            reference_type: ReferenceType,
            keys: &HashSet<String>,
        ) -> BridgeResult<HashMap<String, String>>;
        async fn create_referenced(&self, reference_type: ReferenceType, key: &str) -> BridgeResult<String>;
    }
}
