use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Optimistic-concurrency mismatch: the entity changed since it was read.
    #[error("Version conflict on {id}: {message}")]
    Conflict { id: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),
}

impl BridgeError {
    /// Whether this error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, BridgeError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
