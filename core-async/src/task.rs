//! Bounded fan-out of futures.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Drive every future to completion with at most `limit` in flight.
///
/// Results come back in completion order, not submission order. A `limit` of
/// zero is treated as one so the call always makes progress.
pub async fn run_bounded<I, F>(futures: I, limit: usize) -> Vec<F::Output>
where
    I: IntoIterator<Item = F>,
    F: Future,
{
    stream::iter(futures)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}
