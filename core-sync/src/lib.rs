//! # Batch Sync Engine
//!
//! Reconciles caller-supplied drafts with the entities of a remote store.
//!
//! ## Overview
//!
//! For each batch of drafts the engine:
//! - Validates drafts and reports the ones that cannot be synced
//! - Resolves key references to ids through a bounded, shared cache
//! - Fetches the existing entities of the batch in one query
//! - Creates missing entities and updates changed ones, concurrently
//! - Retries an update once after an optimistic-concurrency conflict
//!
//! Failures never escape [`SyncOrchestrator::process`]; they are reported
//! through the callbacks on [`SyncOptions`] and counted in the returned
//! [`StatisticsSnapshot`].
//!
//! ## Components
//!
//! - **Options** (`options`): Limits, ensure mode and caller hooks, with a validating builder
//! - **Validator** (`validator`): Per-draft validation and reference-key collection
//! - **Identifier Cache** (`cache`): LRU key-to-id mappings per reference type
//! - **Resolver** (`resolver`): Batched key-to-id fetches and draft rewriting
//! - **Lookup** (`lookup`): Batched existing-entity query
//! - **Differ** (`differ`): Update-action computation supplied per resource
//! - **Retry** (`retry`): Chunked updates with a single conflict retry
//! - **Batch** (`batch`): Batch splitting and the per-batch phase machine
//! - **Orchestrator** (`orchestrator`): The pipeline itself

pub mod batch;
pub mod cache;
pub mod differ;
pub mod error;
pub mod lookup;
pub mod options;
pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod statistics;
pub mod validator;

#[cfg(test)]
mod testing;

pub use batch::{batch_elements, BatchPhase, BatchRun};
pub use cache::IdentifierCache;
pub use differ::{diff_fn, DiffFn, Differ};
pub use error::{RemoteOperation, Result, RetryFailure, SyncError};
pub use lookup::ExistingEntityLookup;
pub use options::{
    BeforeCreateCallback, BeforeUpdateCallback, ErrorCallback, SyncOptions, SyncOptionsBuilder,
    SyncSettings, WarningCallback,
};
pub use orchestrator::SyncOrchestrator;
pub use resolver::ReferenceResolver;
pub use retry::{ConflictRetryHandler, FailedUpdate, UpdateOutcome};
pub use statistics::{StatisticsSnapshot, SyncSessionId, SyncStatistics};
pub use validator::{BatchValidator, ReferenceKeys, ValidatedBatch, ValidationOutcome};
