//! # Batch Lifecycle
//!
//! Splitting input into batches and tracking each batch through its phases.
//!
//! ## State Machine
//!
//! ```text
//! Validating → CachingReferences → Resolving → Fetching → Reconciling → Done
//!      │               │               │           │
//!      └──→ Done       └──→ Failed     └──→ Done   └──→ Failed
//! ```
//!
//! Any non-terminal phase may also move to `Failed`.

use core_async::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

use crate::error::{Result, SyncError};

/// Split `items` into consecutive batches of at most `size` elements.
///
/// A `size` of zero is treated as one.
pub fn batch_elements<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        batches.push(items.by_ref().take(size).collect());
    }

    batches
}

// ============================================================================
// Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Validating,
    CachingReferences,
    Resolving,
    Fetching,
    Reconciling,
    Done,
    Failed,
}

impl BatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::Validating => "validating",
            BatchPhase::CachingReferences => "caching_references",
            BatchPhase::Resolving => "resolving",
            BatchPhase::Fetching => "fetching",
            BatchPhase::Reconciling => "reconciling",
            BatchPhase::Done => "done",
            BatchPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchPhase::Done | BatchPhase::Failed)
    }

    pub fn can_transition_to(&self, to: BatchPhase) -> bool {
        use BatchPhase::*;

        match (self, to) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Validating, CachingReferences | Done) => true,
            (CachingReferences, Resolving) => true,
            (Resolving, Fetching | Done) => true,
            (Fetching, Reconciling | Done) => true,
            (Reconciling, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Batch Run
// ============================================================================

/// Phase tracker for one batch
#[derive(Debug)]
pub struct BatchRun {
    index: usize,
    size: usize,
    phase: BatchPhase,
    started: Instant,
}

impl BatchRun {
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size,
            phase: BatchPhase::Validating,
            started: Instant::now(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move to `to`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidStateTransition`] if the move is not allowed
    pub fn advance(&mut self, to: BatchPhase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(SyncError::InvalidStateTransition {
                from: self.phase.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        debug!(batch = self.index, from = %self.phase, to = %to, "Batch phase transition");
        self.phase = to;
        Ok(())
    }

    /// Mark the batch failed after `reason` aborted it.
    ///
    /// A batch that already settled keeps its phase; the rejected transition
    /// is logged.
    pub fn abort(&mut self, reason: &SyncError) {
        error!(batch = self.index, phase = %self.phase, "Batch aborted: {}", reason);
        if let Err(err) = self.advance(BatchPhase::Failed) {
            error!(batch = self.index, "{}", err);
        }
    }
}
