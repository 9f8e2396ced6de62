//! Async runtime shim for the batch sync engine.
//!
//! Every engine crate goes through this crate instead of naming tokio
//! directly, so the executor can be swapped in one place.
//!
//! # Modules
//!
//! - `task`: bounded fan-out of futures
//! - `time`: instants and durations used for batch timing
//! - `sync`: async-aware locks and once-cells
//!
//! # Examples
//!
//! ```rust
//! use core_async::task::run_bounded;
//!
//! # async fn example() {
//! let doubled = run_bounded((1..=4).map(|n| async move { n * 2 }), 2).await;
//! assert_eq!(doubled.len(), 4);
//! # }
//! ```

pub mod sync;
pub mod task;
pub mod time;

pub use task::run_bounded;
pub use time::{Duration, Instant};
