//! Workspace facade crate.
//!
//! Re-exports the engine crates so hosts can depend on `batchsync-workspace`
//! alone. The shipped inventory adapter sits behind the `inventory` feature
//! (enabled by default).

pub use bridge_traits;
pub use core_runtime;
pub use core_sync;

#[cfg(feature = "inventory")]
pub use resource_inventory;
