//! Update-action computation
//!
//! A [`Differ`] compares an existing entity with a resolved draft and returns
//! the ordered actions that make the entity match the draft. Diffing is pure
//! CPU work; it must not perform I/O.

use std::fmt;
use std::marker::PhantomData;

use bridge_traits::SyncResource;

/// Computes the update actions for one resource type.
///
/// An empty result means the entity already matches the draft.
pub trait Differ<R: SyncResource>: Send + Sync {
    fn diff(&self, existing: &R::Entity, draft: &R::Draft) -> Vec<R::Action>;
}

/// [`Differ`] backed by a plain function or closure.
pub struct DiffFn<R, F> {
    diff: F,
    _resource: PhantomData<fn() -> R>,
}

/// Wrap a closure as a [`Differ`]
pub fn diff_fn<R, F>(diff: F) -> DiffFn<R, F>
where
    R: SyncResource,
    F: Fn(&R::Entity, &R::Draft) -> Vec<R::Action> + Send + Sync,
{
    DiffFn {
        diff,
        _resource: PhantomData,
    }
}

impl<R, F> Differ<R> for DiffFn<R, F>
where
    R: SyncResource,
    F: Fn(&R::Entity, &R::Draft) -> Vec<R::Action> + Send + Sync,
{
    fn diff(&self, existing: &R::Entity, draft: &R::Draft) -> Vec<R::Action> {
        (self.diff)(existing, draft)
    }
}

impl<R, F> fmt::Debug for DiffFn<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiffFn")
    }
}
