//! Conflict-aware updates
//!
//! Applies update actions in request-sized chunks. On an optimistic-concurrency
//! conflict the entity is re-fetched once, the actions are recomputed against
//! the fresh state, and the update is retried once.

use std::sync::Arc;

use bridge_traits::{BridgeError, IdOrKey, RemoteStore, SyncResource};
use tracing::{debug, warn};

use crate::error::{RemoteOperation, RetryFailure, SyncError};

/// Outcome of a successful [`ConflictRetryHandler::update_with_retry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome<E> {
    /// The remote store applied the actions and returned the new state
    Updated(E),
    /// After a conflict the fresh entity already matched the draft
    Converged,
}

/// A failed [`ConflictRetryHandler::update_with_retry`] and the last request
/// it attempted
#[derive(Debug)]
pub struct FailedUpdate<E, A> {
    pub error: SyncError,
    /// Entity the last attempted request targeted, re-fetched after a conflict
    pub entity: E,
    /// Actions of the last attempted request
    pub actions: Vec<A>,
}

type UpdateResult<R> = std::result::Result<
    UpdateOutcome<<R as SyncResource>::Entity>,
    FailedUpdate<<R as SyncResource>::Entity, <R as SyncResource>::Action>,
>;

pub struct ConflictRetryHandler<R: SyncResource> {
    store: Arc<dyn RemoteStore<R>>,
    max_update_actions: usize,
}

impl<R: SyncResource> ConflictRetryHandler<R> {
    pub fn new(store: Arc<dyn RemoteStore<R>>, max_update_actions: usize) -> Self {
        Self {
            store,
            max_update_actions: max_update_actions.max(1),
        }
    }

    /// Update `existing` with `actions`, retrying once after a conflict.
    ///
    /// `replan` recomputes the actions for the re-fetched entity; an empty
    /// plan ends in [`UpdateOutcome::Converged`] without another request.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Remote`] for a non-conflict failure of the first attempt
    /// - [`SyncError::RetryExhausted`] when the re-fetch or the retry fails
    ///
    /// The returned [`FailedUpdate`] carries the re-fetched entity and the
    /// recomputed actions once the retry was attempted, and the original
    /// ones otherwise.
    pub async fn update_with_retry<F>(
        &self,
        existing: &R::Entity,
        actions: &[R::Action],
        replan: F,
    ) -> UpdateResult<R>
    where
        F: FnOnce(&R::Entity) -> Vec<R::Action> + Send,
    {
        let identifier = R::entity_identifier(existing).to_string();

        let conflict = match self.apply_chunked(existing, actions).await {
            Ok(updated) => return Ok(UpdateOutcome::Updated(updated)),
            Err(err) if err.is_conflict() => err,
            Err(source) => {
                return Err(FailedUpdate {
                    error: SyncError::Remote {
                        operation: RemoteOperation::Update,
                        identifier,
                        source,
                    },
                    entity: existing.clone(),
                    actions: actions.to_vec(),
                })
            }
        };

        warn!(
            resource = R::RESOURCE_NAME,
            %identifier,
            version = R::entity_version(existing),
            "{}; re-fetching before a single retry",
            conflict
        );

        let exhausted = |reason, entity: &R::Entity, actions: &[R::Action]| FailedUpdate {
            error: SyncError::RetryExhausted {
                identifier: identifier.clone(),
                reason,
            },
            entity: entity.clone(),
            actions: actions.to_vec(),
        };

        let id_or_key = IdOrKey::Id(R::entity_id(existing).to_string());
        let refreshed = match self.store.fetch_by_id_or_key(&id_or_key).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return Err(exhausted(RetryFailure::NotFound, existing, actions)),
            Err(err) => return Err(exhausted(RetryFailure::RefetchFailed(err), existing, actions)),
        };

        let replanned = replan(&refreshed);
        if replanned.is_empty() {
            debug!(%identifier, "Re-fetched entity already up to date");
            return Ok(UpdateOutcome::Converged);
        }

        match self.apply_chunked(&refreshed, &replanned).await {
            Ok(updated) => Ok(UpdateOutcome::Updated(updated)),
            Err(err) => {
                let reason = if err.is_conflict() {
                    RetryFailure::ConflictAgain(err)
                } else {
                    RetryFailure::UpdateFailed(err)
                };
                Err(exhausted(reason, &refreshed, &replanned))
            }
        }
    }

    /// Send `actions` in chunks of at most `max_update_actions`, each against
    /// the entity returned by the previous request
    async fn apply_chunked(
        &self,
        entity: &R::Entity,
        actions: &[R::Action],
    ) -> std::result::Result<R::Entity, BridgeError> {
        let mut current: Option<R::Entity> = None;

        for chunk in actions.chunks(self.max_update_actions) {
            let target = current.as_ref().unwrap_or(entity);
            let updated = self.store.update(target, chunk).await?;
            current = Some(updated);
        }

        Ok(current.unwrap_or_else(|| entity.clone()))
    }
}
