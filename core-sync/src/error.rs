use bridge_traits::{BridgeError, ReferenceType};
use std::fmt;
use thiserror::Error;

/// Remote write issued for a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    Create,
    Update,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOperation::Create => f.write_str("create"),
            RemoteOperation::Update => f.write_str("update"),
        }
    }
}

/// Why the single retry after a version conflict did not succeed
#[derive(Error, Debug)]
pub enum RetryFailure {
    #[error("the retried update conflicted again ({0})")]
    ConflictAgain(BridgeError),

    #[error("the entity no longer exists; it was deleted concurrently")]
    NotFound,

    #[error("re-fetching the entity failed ({0})")]
    RefetchFailed(BridgeError),

    #[error("the retried update failed ({0})")]
    UpdateFailed(BridgeError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate identifier '{identifier}' in batch; only the last draft is synced")]
    DuplicateIdentifier { identifier: String },

    #[error("Failed to resolve references of draft '{identifier}': {message}")]
    ReferenceResolution { identifier: String, message: String },

    #[error("Failed to build a cache of keys to ids for '{reference_type}' references: {source}")]
    CachePopulation {
        reference_type: ReferenceType,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to fetch existing {resource} with identifiers [{identifiers}]: {source}")]
    ExistingEntityFetch {
        resource: &'static str,
        identifiers: String,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to {operation} '{identifier}': {source}")]
    Remote {
        operation: RemoteOperation,
        identifier: String,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to update '{identifier}' after a version conflict: {reason}")]
    RetryExhausted {
        identifier: String,
        #[source]
        reason: RetryFailure,
    },

    #[error("Invalid batch phase transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid sync configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
