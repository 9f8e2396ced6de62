//! Time utilities.

pub use std::time::{Duration, Instant};
pub use tokio::time::sleep;
