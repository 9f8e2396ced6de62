//! Sync Options
//!
//! Immutable configuration captured when an orchestrator is built: batching
//! and concurrency limits, cache sizing, ensure mode, and the caller's hooks.
//!
//! ## Example
//!
//! ```ignore
//! let options = SyncOptions::<InventoryResource>::builder()
//!     .batch_size(50)
//!     .ensure_referenced_entities(true)
//!     .error_callback(|err, _draft, _entity, _actions| eprintln!("{err}"))
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use bridge_traits::SyncResource;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{Result, SyncError};

/// Default number of drafts per batch
pub const DEFAULT_BATCH_SIZE: usize = 150;
/// Default number of drafts reconciled concurrently inside a batch
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Default number of cached key-to-id mappings per reference type
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
/// Default maximum number of update actions sent in one request
pub const DEFAULT_MAX_UPDATE_ACTIONS: usize = 500;

/// Transform or drop a draft before it is created
pub type BeforeCreateCallback<R> =
    Arc<dyn Fn(<R as SyncResource>::Draft) -> Option<<R as SyncResource>::Draft> + Send + Sync>;

/// Filter or extend the update actions computed for an existing entity
pub type BeforeUpdateCallback<R> = Arc<
    dyn Fn(
            Vec<<R as SyncResource>::Action>,
            &<R as SyncResource>::Draft,
            &<R as SyncResource>::Entity,
        ) -> Vec<<R as SyncResource>::Action>
        + Send
        + Sync,
>;

/// Receives every per-draft or per-batch failure
pub type ErrorCallback<R> = Arc<
    dyn Fn(
            &SyncError,
            Option<&<R as SyncResource>::Draft>,
            Option<&<R as SyncResource>::Entity>,
            Option<&[<R as SyncResource>::Action]>,
        ) + Send
        + Sync,
>;

/// Receives non-fatal conditions such as duplicate identifiers
pub type WarningCallback<R> = Arc<
    dyn Fn(&SyncError, Option<&<R as SyncResource>::Draft>, Option<&<R as SyncResource>::Entity>)
        + Send
        + Sync,
>;

/// Plain, serializable subset of the options.
///
/// Missing fields fall back to their defaults, so a partial JSON document is
/// enough:
///
/// ```ignore
/// let settings: SyncSettings = serde_json::from_str(r#"{"batch_size": 30}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub concurrency: usize,
    /// Per reference type
    pub cache_capacity: usize,
    pub max_update_actions: usize,
    /// Create referenced entities that do not exist yet
    pub ensure_referenced_entities: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_update_actions: DEFAULT_MAX_UPDATE_ACTIONS,
            ensure_referenced_entities: false,
        }
    }
}

/// Configuration of one [`SyncOrchestrator`](crate::orchestrator::SyncOrchestrator)
pub struct SyncOptions<R: SyncResource> {
    settings: SyncSettings,
    before_create: Option<BeforeCreateCallback<R>>,
    before_update: Option<BeforeUpdateCallback<R>>,
    error_callback: Option<ErrorCallback<R>>,
    warning_callback: Option<WarningCallback<R>>,
}

impl<R: SyncResource> SyncOptions<R> {
    pub fn builder() -> SyncOptionsBuilder<R> {
        SyncOptionsBuilder::default()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    pub fn concurrency(&self) -> usize {
        self.settings.concurrency
    }

    pub fn cache_capacity(&self) -> usize {
        self.settings.cache_capacity
    }

    pub fn max_update_actions(&self) -> usize {
        self.settings.max_update_actions
    }

    pub fn ensure_referenced_entities(&self) -> bool {
        self.settings.ensure_referenced_entities
    }

    /// Run the before-create hook; without one the draft passes unchanged
    pub fn apply_before_create(&self, draft: R::Draft) -> Option<R::Draft> {
        match &self.before_create {
            Some(callback) => callback(draft),
            None => Some(draft),
        }
    }

    /// Run the before-update hook.
    ///
    /// An empty action list is returned as-is without consulting the hook.
    pub fn apply_before_update(
        &self,
        actions: Vec<R::Action>,
        draft: &R::Draft,
        existing: &R::Entity,
    ) -> Vec<R::Action> {
        if actions.is_empty() {
            return actions;
        }
        match &self.before_update {
            Some(callback) => callback(actions, draft, existing),
            None => actions,
        }
    }

    /// Log the error and forward it to the error callback, if any
    pub fn apply_error(
        &self,
        err: &SyncError,
        draft: Option<&R::Draft>,
        existing: Option<&R::Entity>,
        actions: Option<&[R::Action]>,
    ) {
        error!(resource = R::RESOURCE_NAME, "{}", err);
        if let Some(callback) = &self.error_callback {
            callback(err, draft, existing, actions);
        }
    }

    /// Log the warning and forward it to the warning callback, if any
    pub fn apply_warning(
        &self,
        warning: &SyncError,
        draft: Option<&R::Draft>,
        existing: Option<&R::Entity>,
    ) {
        warn!(resource = R::RESOURCE_NAME, "{}", warning);
        if let Some(callback) = &self.warning_callback {
            callback(warning, draft, existing);
        }
    }
}

impl<R: SyncResource> Clone for SyncOptions<R> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            before_create: self.before_create.clone(),
            before_update: self.before_update.clone(),
            error_callback: self.error_callback.clone(),
            warning_callback: self.warning_callback.clone(),
        }
    }
}

impl<R: SyncResource> fmt::Debug for SyncOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("resource", &R::RESOURCE_NAME)
            .field("settings", &self.settings)
            .field("before_create", &self.before_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("error_callback", &self.error_callback.is_some())
            .field("warning_callback", &self.warning_callback.is_some())
            .finish()
    }
}

/// Builder for [`SyncOptions`]; validation happens in [`build`](Self::build).
pub struct SyncOptionsBuilder<R: SyncResource> {
    settings: SyncSettings,
    before_create: Option<BeforeCreateCallback<R>>,
    before_update: Option<BeforeUpdateCallback<R>>,
    error_callback: Option<ErrorCallback<R>>,
    warning_callback: Option<WarningCallback<R>>,
}

impl<R: SyncResource> Default for SyncOptionsBuilder<R> {
    fn default() -> Self {
        Self::from_settings(SyncSettings::default())
    }
}

impl<R: SyncResource> SyncOptionsBuilder<R> {
    /// Start from externally loaded settings
    pub fn from_settings(settings: SyncSettings) -> Self {
        Self {
            settings,
            before_create: None,
            before_update: None,
            error_callback: None,
            warning_callback: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.settings.batch_size = batch_size;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.settings.concurrency = concurrency;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.settings.cache_capacity = capacity;
        self
    }

    pub fn max_update_actions(mut self, max: usize) -> Self {
        self.settings.max_update_actions = max;
        self
    }

    pub fn ensure_referenced_entities(mut self, ensure: bool) -> Self {
        self.settings.ensure_referenced_entities = ensure;
        self
    }

    pub fn before_create<F>(mut self, callback: F) -> Self
    where
        F: Fn(R::Draft) -> Option<R::Draft> + Send + Sync + 'static,
    {
        self.before_create = Some(Arc::new(callback));
        self
    }

    pub fn before_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<R::Action>, &R::Draft, &R::Entity) -> Vec<R::Action> + Send + Sync + 'static,
    {
        self.before_update = Some(Arc::new(callback));
        self
    }

    pub fn error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SyncError, Option<&R::Draft>, Option<&R::Entity>, Option<&[R::Action]>)
            + Send
            + Sync
            + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self
    }

    pub fn warning_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SyncError, Option<&R::Draft>, Option<&R::Entity>) + Send + Sync + 'static,
    {
        self.warning_callback = Some(Arc::new(callback));
        self
    }

    /// Validate and freeze the options.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] when any size or limit is zero.
    pub fn build(self) -> Result<SyncOptions<R>> {
        let positive = [
            ("batch_size", self.settings.batch_size),
            ("concurrency", self.settings.concurrency),
            ("cache_capacity", self.settings.cache_capacity),
            ("max_update_actions", self.settings.max_update_actions),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(SyncError::InvalidConfig {
                    field: field.to_string(),
                    message: format!("{} must be greater than zero", field),
                });
            }
        }

        Ok(SyncOptions {
            settings: self.settings,
            before_create: self.before_create,
            before_update: self.before_update,
            error_callback: self.error_callback,
            warning_callback: self.warning_callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Widget, WidgetAction, WidgetDraft, WidgetResource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let options = SyncOptions::<WidgetResource>::builder().build().unwrap();
        assert_eq!(options.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(options.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(options.cache_capacity(), 10_000);
        assert_eq!(options.max_update_actions(), 500);
        assert!(!options.ensure_referenced_entities());
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let err = SyncOptions::<WidgetResource>::builder()
            .batch_size(0)
            .build()
            .unwrap_err();
        assert!(
            matches!(err, SyncError::InvalidConfig { ref field, .. } if field == "batch_size")
        );

        let err = SyncOptions::<WidgetResource>::builder()
            .max_update_actions(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_update_actions must be greater than zero"));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: SyncSettings =
            serde_json::from_str(r#"{"batch_size": 30, "ensure_referenced_entities": true}"#)
                .unwrap();
        assert_eq!(settings.batch_size, 30);
        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);

        let options = SyncOptionsBuilder::<WidgetResource>::from_settings(settings)
            .build()
            .unwrap();
        assert_eq!(options.batch_size(), 30);
        assert!(options.ensure_referenced_entities());
    }

    #[test]
    fn test_before_create_without_callback_passes_draft() {
        let options = SyncOptions::<WidgetResource>::builder().build().unwrap();
        let draft = WidgetDraft::new("w-1", 3);
        assert_eq!(options.apply_before_create(draft.clone()), Some(draft));
    }

    #[test]
    fn test_before_create_can_drop() {
        let options = SyncOptions::<WidgetResource>::builder()
            .before_create(|draft: WidgetDraft| (draft.size > 5).then_some(draft))
            .build()
            .unwrap();
        assert!(options.apply_before_create(WidgetDraft::new("w-1", 3)).is_none());
        assert!(options.apply_before_create(WidgetDraft::new("w-2", 8)).is_some());
    }

    #[test]
    fn test_before_update_skipped_for_empty_actions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let options = SyncOptions::<WidgetResource>::builder()
            .before_update(move |actions, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                actions
            })
            .build()
            .unwrap();

        let draft = WidgetDraft::new("w-1", 3);
        let existing = Widget::new("id-1", "w-1", 1, 2);
        assert!(options.apply_before_update(Vec::new(), &draft, &existing).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let actions = options.apply_before_update(vec![WidgetAction::SetSize(3)], &draft, &existing);
        assert_eq!(actions, vec![WidgetAction::SetSize(3)]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_callback_receives_context() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = SyncOptions::<WidgetResource>::builder()
            .error_callback(move |err, draft, _, actions| {
                sink.lock()
                    .unwrap()
                    .push((err.to_string(), draft.is_some(), actions.map(<[_]>::len)));
            })
            .build()
            .unwrap();

        let draft = WidgetDraft::new("w-1", 3);
        options.apply_error(
            &SyncError::Validation("boom".to_string()),
            Some(&draft),
            None,
            Some(&[WidgetAction::SetSize(3)]),
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("Validation failed: boom".to_string(), true, Some(1)));
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let options = SyncOptions::<WidgetResource>::builder()
            .warning_callback(|_, _, _| {})
            .build()
            .unwrap();
        let debug = format!("{:?}", options);
        assert!(debug.contains("warning_callback: true"));
        assert!(debug.contains("before_create: false"));
    }
}
