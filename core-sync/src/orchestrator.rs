//! # Sync Orchestrator
//!
//! Drives drafts of one resource type through the reconciliation pipeline.
//!
//! ## Workflow
//!
//! For every batch of `batch_size` drafts:
//! 1. Validate drafts and collect their reference keys
//! 2. Populate the identifier cache with one key-to-id fetch per reference type
//! 3. Resolve key references of each draft (concurrently)
//! 4. Fetch the existing entities of the batch in one query
//! 5. Create or update each draft (concurrently, retrying once on conflict)
//!
//! Batches run one after another. Every failure ends up in the error
//! callback and the statistics; [`SyncOrchestrator::process`] never fails.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncOptions, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! let options = SyncOptions::<CustomerResource>::builder().batch_size(50).build()?;
//! let orchestrator = SyncOrchestrator::new(options, store, references, Arc::new(CustomerDiffer))?;
//!
//! let stats = orchestrator.process_drafts(drafts).await;
//! println!("{}", stats.report_message());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_traits::{ReferenceStore, RemoteStore, SyncResource};
use core_async::task::run_bounded;
use tracing::{debug, info, instrument};

use crate::batch::{batch_elements, BatchPhase, BatchRun};
use crate::cache::IdentifierCache;
use crate::differ::Differ;
use crate::error::{RemoteOperation, Result, SyncError};
use crate::lookup::ExistingEntityLookup;
use crate::options::SyncOptions;
use crate::resolver::ReferenceResolver;
use crate::retry::{ConflictRetryHandler, UpdateOutcome};
use crate::statistics::{StatisticsSnapshot, SyncSessionId, SyncStatistics};
use crate::validator::BatchValidator;

pub struct SyncOrchestrator<R: SyncResource> {
    options: Arc<SyncOptions<R>>,
    store: Arc<dyn RemoteStore<R>>,
    differ: Arc<dyn Differ<R>>,
    cache: Arc<IdentifierCache>,
    statistics: Arc<SyncStatistics>,
    validator: BatchValidator<R>,
    resolver: ReferenceResolver,
    lookup: ExistingEntityLookup<R>,
    retry: ConflictRetryHandler<R>,
    next_batch: AtomicUsize,
}

impl<R: SyncResource> SyncOrchestrator<R> {
    /// Create an orchestrator with a fresh identifier cache
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] if the cache cannot be sized from
    /// the options.
    pub fn new(
        options: SyncOptions<R>,
        store: Arc<dyn RemoteStore<R>>,
        references: Arc<dyn ReferenceStore>,
        differ: Arc<dyn Differ<R>>,
    ) -> Result<Self> {
        let cache = Arc::new(IdentifierCache::new(options.cache_capacity())?);
        Ok(Self::with_cache(options, store, references, differ, cache))
    }

    /// Create an orchestrator around an existing, possibly pre-seeded cache
    pub fn with_cache(
        options: SyncOptions<R>,
        store: Arc<dyn RemoteStore<R>>,
        references: Arc<dyn ReferenceStore>,
        differ: Arc<dyn Differ<R>>,
        cache: Arc<IdentifierCache>,
    ) -> Self {
        let options = Arc::new(options);
        let statistics = Arc::new(SyncStatistics::new(SyncSessionId::new(), R::RESOURCE_NAME));

        Self {
            validator: BatchValidator::new(Arc::clone(&options), Arc::clone(&statistics)),
            resolver: ReferenceResolver::new(
                references,
                Arc::clone(&cache),
                options.ensure_referenced_entities(),
            ),
            lookup: ExistingEntityLookup::new(Arc::clone(&store), Arc::clone(&cache)),
            retry: ConflictRetryHandler::new(Arc::clone(&store), options.max_update_actions()),
            options,
            store,
            differ,
            cache,
            statistics,
            next_batch: AtomicUsize::new(0),
        }
    }

    pub fn session_id(&self) -> SyncSessionId {
        self.statistics.session_id()
    }

    pub fn options(&self) -> &SyncOptions<R> {
        &self.options
    }

    pub fn cache(&self) -> &Arc<IdentifierCache> {
        &self.cache
    }

    /// Current statistics; may be called while `process` is running
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    /// Sync drafts that are known to be present
    pub async fn process_drafts(&self, drafts: Vec<R::Draft>) -> StatisticsSnapshot {
        self.process(drafts.into_iter().map(Some).collect()).await
    }

    /// Sync `drafts` batch by batch and return the accumulated statistics.
    ///
    /// `None` entries are reported as invalid drafts.
    #[instrument(
        skip(self, drafts),
        fields(session_id = %self.session_id(), resource = R::RESOURCE_NAME, drafts = drafts.len())
    )]
    pub async fn process(&self, drafts: Vec<Option<R::Draft>>) -> StatisticsSnapshot {
        for batch in batch_elements(drafts, self.options.batch_size()) {
            let index = self.next_batch.fetch_add(1, Ordering::SeqCst);
            self.process_batch(index, batch).await;
        }

        let snapshot = self.statistics.snapshot();
        info!("{}", snapshot.report_message());
        snapshot
    }

    #[instrument(skip(self, index, batch), fields(batch = index, size = batch.len()))]
    async fn process_batch(&self, index: usize, batch: Vec<Option<R::Draft>>) {
        let size = batch.len();
        let mut run = BatchRun::new(index, size);
        self.statistics.start_batch();

        if let Err(err) = self.run_phases(&mut run, batch).await {
            run.abort(&err);
        }

        self.statistics.increment_processed(size as u64);
        self.statistics.finish_batch(run.elapsed());
        debug!(phase = %run.phase(), elapsed_ms = run.elapsed().as_millis() as u64, "Batch settled");
    }

    async fn run_phases(&self, run: &mut BatchRun, batch: Vec<Option<R::Draft>>) -> Result<()> {
        let validated = self.validator.validate(batch);
        if validated.valid.is_empty() {
            return run.advance(BatchPhase::Done);
        }

        run.advance(BatchPhase::CachingReferences)?;
        let snapshot = match self.resolver.populate_cache(&validated.referenced_keys).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.fail_batch(&err, validated.valid.len());
                return run.advance(BatchPhase::Failed);
            }
        };

        run.advance(BatchPhase::Resolving)?;
        let resolved = self.resolve_drafts(validated.valid, &snapshot).await;
        if resolved.is_empty() {
            return run.advance(BatchPhase::Done);
        }

        run.advance(BatchPhase::Fetching)?;
        let identifiers: HashSet<R::Identifier> =
            resolved.iter().filter_map(R::draft_identifier).collect();
        let existing = match self.lookup.fetch(&identifiers).await {
            Ok(existing) => existing,
            Err(err) => {
                self.fail_batch(&err, resolved.len());
                return run.advance(BatchPhase::Failed);
            }
        };

        run.advance(BatchPhase::Reconciling)?;
        self.reconcile(resolved, &existing).await;
        run.advance(BatchPhase::Done)
    }

    /// Resolve every draft; failed drafts are reported and left out
    async fn resolve_drafts(
        &self,
        drafts: Vec<R::Draft>,
        snapshot: &bridge_traits::ResolvedReferences,
    ) -> Vec<R::Draft> {
        let results = run_bounded(
            drafts.into_iter().map(move |draft| async move {
                let result = self.resolver.resolve::<R>(draft.clone(), snapshot).await;
                (draft, result)
            }),
            self.options.concurrency(),
        )
        .await;

        let mut resolved = Vec::with_capacity(results.len());
        for (draft, result) in results {
            match result {
                Ok(draft) => resolved.push(draft),
                Err(err) => {
                    self.options.apply_error(&err, Some(&draft), None, None);
                    self.statistics.increment_failed(1);
                }
            }
        }
        resolved
    }

    async fn reconcile(&self, drafts: Vec<R::Draft>, existing: &HashMap<R::Identifier, R::Entity>) {
        run_bounded(
            drafts.into_iter().map(move |draft| async move {
                let current = R::draft_identifier(&draft).and_then(|id| existing.get(&id));
                match current {
                    Some(entity) => self.sync_update(draft, entity).await,
                    None => self.sync_create(draft).await,
                }
            }),
            self.options.concurrency(),
        )
        .await;
    }

    async fn sync_create(&self, draft: R::Draft) {
        let draft = match self.options.apply_before_create(draft) {
            Some(draft) => draft,
            None => {
                debug!("Draft dropped by before-create callback");
                return;
            }
        };

        match self.store.create(&draft).await {
            Ok(entity) => {
                self.statistics.increment_created();
                if let Some((reference_type, key)) = R::self_reference(&entity) {
                    self.cache
                        .insert(reference_type, key, R::entity_id(&entity))
                        .await;
                }
            }
            Err(source) => {
                let err = SyncError::Remote {
                    operation: RemoteOperation::Create,
                    identifier: identifier_of::<R>(&draft),
                    source,
                };
                self.options.apply_error(&err, Some(&draft), None, None);
                self.statistics.increment_failed(1);
            }
        }
    }

    async fn sync_update(&self, draft: R::Draft, existing: &R::Entity) {
        let actions = self.plan(&draft, existing);
        if actions.is_empty() {
            debug!(identifier = %identifier_of::<R>(&draft), "Already up to date");
            return;
        }

        let outcome = self
            .retry
            .update_with_retry(existing, &actions, |fresh| self.plan(&draft, fresh))
            .await;

        match outcome {
            Ok(UpdateOutcome::Updated(_)) => self.statistics.increment_updated(),
            Ok(UpdateOutcome::Converged) => {
                debug!(identifier = %identifier_of::<R>(&draft), "Converged after conflict");
            }
            Err(failed) => {
                self.options.apply_error(
                    &failed.error,
                    Some(&draft),
                    Some(&failed.entity),
                    Some(failed.actions.as_slice()),
                );
                self.statistics.increment_failed(1);
            }
        }
    }

    /// Diff plus the before-update callback
    fn plan(&self, draft: &R::Draft, existing: &R::Entity) -> Vec<R::Action> {
        let actions = self.differ.diff(existing, draft);
        self.options.apply_before_update(actions, draft, existing)
    }

    /// Report a batch-level failure once and count the affected drafts failed
    fn fail_batch(&self, err: &SyncError, affected: usize) {
        self.options.apply_error(err, None, None, None);
        self.statistics.increment_failed(affected as u64);
    }
}

impl<R: SyncResource> fmt::Debug for SyncOrchestrator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("session_id", &self.session_id())
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn identifier_of<R: SyncResource>(draft: &R::Draft) -> String {
    R::draft_identifier(draft)
        .map(|identifier| identifier.to_string())
        .unwrap_or_default()
}
