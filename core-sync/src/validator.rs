//! Batch Validation
//!
//! Splits a raw batch into drafts that can be synced and drafts that cannot,
//! and collects the reference keys the valid drafts need resolved. No I/O
//! happens here.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use bridge_traits::{ReferenceType, ResourceRef, SyncResource};
use tracing::debug;

use crate::error::SyncError;
use crate::options::SyncOptions;
use crate::statistics::SyncStatistics;

/// Reference keys of one batch, grouped by reference type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceKeys {
    keys: BTreeMap<ReferenceType, HashSet<String>>,
}

impl ReferenceKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference_type: ReferenceType, key: impl Into<String>) {
        self.keys.entry(reference_type).or_default().insert(key.into());
    }

    pub fn keys_of(&self, reference_type: ReferenceType) -> Option<&HashSet<String>> {
        self.keys.get(&reference_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReferenceType, &HashSet<String>)> {
        self.keys.iter().map(|(ty, keys)| (*ty, keys))
    }

    /// Total number of keys across all reference types
    pub fn len(&self) -> usize {
        self.keys.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.values().all(HashSet::is_empty)
    }
}

/// Verdict on a single draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome<I> {
    Valid(I),
    Invalid(String),
}

impl<I> ValidationOutcome<I> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Result of validating one batch
#[derive(Debug)]
pub struct ValidatedBatch<D> {
    /// Drafts to reconcile, one per business identifier
    pub valid: Vec<D>,
    /// Key references of `valid`, grouped by type
    pub referenced_keys: ReferenceKeys,
    /// Drafts rejected and already counted failed
    pub invalid: usize,
    /// Earlier drafts replaced by a later one with the same identifier
    pub superseded: usize,
}

pub struct BatchValidator<R: SyncResource> {
    options: Arc<SyncOptions<R>>,
    statistics: Arc<SyncStatistics>,
}

impl<R: SyncResource> BatchValidator<R> {
    pub fn new(options: Arc<SyncOptions<R>>, statistics: Arc<SyncStatistics>) -> Self {
        Self {
            options,
            statistics,
        }
    }

    /// Judge a single draft without reporting anything
    pub fn check(draft: Option<&R::Draft>) -> ValidationOutcome<R::Identifier> {
        let draft = match draft {
            Some(draft) => draft,
            None => return ValidationOutcome::Invalid("Draft is null.".to_string()),
        };

        let identifier = match R::draft_identifier(draft) {
            Some(identifier) => identifier,
            None => {
                return ValidationOutcome::Invalid(format!(
                    "Draft of {} has a blank or missing identifier.",
                    R::RESOURCE_NAME
                ))
            }
        };

        if let Err(reason) = R::check_required_fields(draft) {
            return ValidationOutcome::Invalid(reason);
        }

        let blank_reference = R::references(draft)
            .into_iter()
            .find(|(_, reference)| reference.value().trim().is_empty());
        if let Some((reference_type, _)) = blank_reference {
            return ValidationOutcome::Invalid(format!(
                "Draft '{}' has a blank '{}' reference.",
                identifier, reference_type
            ));
        }

        ValidationOutcome::Valid(identifier)
    }

    /// Validate a batch, reporting every rejected or superseded draft.
    ///
    /// Invalid drafts go to the error callback and are counted failed.
    /// When identifiers repeat, the last draft wins and every earlier one is
    /// reported through the warning callback.
    pub fn validate(&self, drafts: Vec<Option<R::Draft>>) -> ValidatedBatch<R::Draft> {
        let mut candidates: Vec<(R::Identifier, R::Draft)> = Vec::with_capacity(drafts.len());
        let mut invalid = 0;

        for draft in drafts {
            match Self::check(draft.as_ref()) {
                ValidationOutcome::Valid(identifier) => {
                    if let Some(draft) = draft {
                        candidates.push((identifier, draft));
                    }
                }
                ValidationOutcome::Invalid(reason) => {
                    invalid += 1;
                    self.options
                        .apply_error(&SyncError::Validation(reason), draft.as_ref(), None, None);
                }
            }
        }
        if invalid > 0 {
            self.statistics.increment_failed(invalid as u64);
        }

        let mut last_index: HashMap<R::Identifier, usize> = HashMap::with_capacity(candidates.len());
        for (index, (identifier, _)) in candidates.iter().enumerate() {
            last_index.insert(identifier.clone(), index);
        }

        let mut valid = Vec::with_capacity(last_index.len());
        let mut referenced_keys = ReferenceKeys::new();
        let mut superseded = 0;

        for (index, (identifier, draft)) in candidates.into_iter().enumerate() {
            if last_index.get(&identifier) != Some(&index) {
                superseded += 1;
                let warning = SyncError::DuplicateIdentifier {
                    identifier: identifier.to_string(),
                };
                self.options.apply_warning(&warning, Some(&draft), None);
                continue;
            }

            for (reference_type, reference) in R::references(&draft) {
                if let ResourceRef::Key(key) = reference {
                    referenced_keys.insert(reference_type, key);
                }
            }
            valid.push(draft);
        }

        debug!(
            valid = valid.len(),
            invalid,
            superseded,
            referenced_keys = referenced_keys.len(),
            "Validated batch"
        );

        ValidatedBatch {
            valid,
            referenced_keys,
            invalid,
            superseded,
        }
    }
}
