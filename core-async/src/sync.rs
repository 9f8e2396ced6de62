//! Synchronization primitives.
//!
//! Re-exports the tokio primitives the engine shares between concurrently
//! reconciled drafts. All of them are `Send + Sync` and never block the
//! executor thread while waiting.

pub use tokio::sync::{Mutex, MutexGuard, OnceCell};
