//! Core relationship service: invariant checks and guarded transitions

use crate::RelationError;
use amity_domain::traits::{RelationshipStore, StoreFailure};
use amity_domain::{
    derive_status, Edge, EdgeId, EdgeStatus, Friend, FriendRequest, FriendStatus, RequestAction,
    StatusView, UserId,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds since Unix epoch
fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn store_error<E: StoreFailure>(e: E) -> RelationError {
    RelationError::Store(e.to_string())
}

/// Relationship service enforcing the edge invariants
///
/// Responsible for:
/// - Rejecting self-edges and second edges for a pair
/// - Applying every transition through a status-predicated store call
/// - Deriving viewer-relative status from the pair's edge
///
/// The store sits behind a mutex so that lookup-then-insert in
/// [`send_request`](Self::send_request) cannot interleave with another
/// insert on the same pair.
///
/// # Examples
///
/// ```no_run
/// use amity_service::RelationshipService;
/// use amity_store::SqliteStore;
/// use std::sync::{Arc, Mutex};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new(":memory:")?;
/// let service = RelationshipService::new(Arc::new(Mutex::new(store)));
///
/// let edge = service.send_request(&"u-1".into(), &"u-2".into())?;
/// service.accept_request(edge.id)?;
/// # Ok(())
/// # }
/// ```
pub struct RelationshipService<S: RelationshipStore> {
    store: Arc<Mutex<S>>,
}

impl<S: RelationshipStore> RelationshipService<S> {
    /// Create a new service over a shared store
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, RelationError> {
        self.store
            .lock()
            .map_err(|_| RelationError::Store("store lock poisoned".to_string()))
    }

    /// Send a friend request from `requester` to `receiver`
    ///
    /// Fails with `SelfRelation` when the ids match, and with
    /// `DuplicateRelation` when any edge already joins the pair.
    pub fn send_request(&self, requester: &UserId, receiver: &UserId) -> Result<Edge, RelationError> {
        if requester == receiver {
            tracing::debug!("Rejected self request from {}", requester);
            return Err(RelationError::SelfRelation);
        }

        let mut store = self.lock()?;

        if let Some(existing) = store.find_by_pair(requester, receiver).map_err(store_error)? {
            tracing::debug!(
                "Rejected request {} -> {}: edge {} already {}",
                requester,
                receiver,
                existing.id,
                existing.status
            );
            return Err(RelationError::DuplicateRelation);
        }

        let edge = Edge::pending(requester.clone(), receiver.clone(), current_timestamp_millis());
        let edge = store.insert(edge).map_err(|e| {
            if e.is_conflict() {
                RelationError::DuplicateRelation
            } else {
                store_error(e)
            }
        })?;

        tracing::info!(edge_id = %edge.id, "Friend request sent: {} -> {}", requester, receiver);
        Ok(edge)
    }

    /// Status of the relationship with `other`, as seen by `viewer`
    pub fn get_status(&self, viewer: &UserId, other: &UserId) -> Result<FriendStatus, RelationError> {
        let store = self.lock()?;
        let edge = store.find_by_pair(viewer, other).map_err(store_error)?;
        Ok(derive_status(edge.as_ref(), viewer))
    }

    /// Like [`get_status`](Self::get_status), also returning the edge id
    pub fn get_status_view(&self, viewer: &UserId, other: &UserId) -> Result<StatusView, RelationError> {
        let store = self.lock()?;
        let edge = store.find_by_pair(viewer, other).map_err(store_error)?;
        Ok(StatusView::from_edge(edge.as_ref(), viewer))
    }

    /// Accept a pending request
    ///
    /// An unknown id and an already-resolved request both yield `NotFound`.
    pub fn accept_request(&self, request_id: EdgeId) -> Result<Edge, RelationError> {
        let mut store = self.lock()?;
        Self::accept_locked(&mut store, request_id)
    }

    /// Decline (delete) a pending request
    pub fn decline_request(&self, request_id: EdgeId) -> Result<(), RelationError> {
        let mut store = self.lock()?;
        Self::decline_locked(&mut store, request_id)
    }

    /// Answer a pending request on behalf of `acting`
    ///
    /// Only the receiver may accept. Either participant may decline, which
    /// lets a requester withdraw a request they sent. Returns the edge after
    /// accepting, or as it was just before deletion when declining.
    pub fn respond_to_request(
        &self,
        acting: &UserId,
        request_id: EdgeId,
        action: RequestAction,
    ) -> Result<Edge, RelationError> {
        let mut store = self.lock()?;

        let edge = store
            .find_by_id(request_id)
            .map_err(store_error)?
            .filter(|edge| edge.status == EdgeStatus::Pending)
            .ok_or(RelationError::NotFound)?;

        let permitted = match action {
            RequestAction::Accept => &edge.receiver_id == acting,
            RequestAction::Decline => edge.involves(acting),
        };
        if !permitted {
            tracing::warn!("{} may not {:?} request {}", acting, action, request_id);
            return Err(RelationError::Forbidden);
        }

        match action {
            RequestAction::Accept => Self::accept_locked(&mut store, request_id),
            RequestAction::Decline => {
                Self::decline_locked(&mut store, request_id)?;
                Ok(edge)
            }
        }
    }

    /// Remove an accepted friendship
    ///
    /// `acting` must be one of the two participants.
    pub fn remove_friend(&self, friendship_id: EdgeId, acting: &UserId) -> Result<(), RelationError> {
        let mut store = self.lock()?;

        let edge = store
            .find_by_id(friendship_id)
            .map_err(store_error)?
            .ok_or(RelationError::NotFound)?;

        if !edge.involves(acting) {
            tracing::warn!("{} may not remove friendship {}", acting, friendship_id);
            return Err(RelationError::Forbidden);
        }
        if edge.status != EdgeStatus::Accepted {
            return Err(RelationError::NotFound);
        }

        if !store
            .delete_where(friendship_id, EdgeStatus::Accepted)
            .map_err(store_error)?
        {
            return Err(RelationError::NotFound);
        }

        tracing::info!(edge_id = %friendship_id, "Friendship removed by {}", acting);
        Ok(())
    }

    /// Remove the friendship between `acting` and `other`, addressed by user
    pub fn unfriend(&self, acting: &UserId, other: &UserId) -> Result<(), RelationError> {
        let mut store = self.lock()?;

        if !store
            .delete_by_pair_where(acting, other, EdgeStatus::Accepted)
            .map_err(store_error)?
        {
            return Err(RelationError::NotFound);
        }

        tracing::info!("Friendship {} <-> {} removed by {}", acting, other, acting);
        Ok(())
    }

    /// Pending requests received by `user`, newest first
    pub fn get_pending_requests(&self, user: &UserId) -> Result<Vec<FriendRequest>, RelationError> {
        let store = self.lock()?;
        store.list_pending_for_receiver(user).map_err(store_error)
    }

    /// Accepted friendships of `user`, most recent first
    pub fn list_friends(&self, user: &UserId) -> Result<Vec<Friend>, RelationError> {
        let store = self.lock()?;
        store.list_accepted_for(user).map_err(store_error)
    }

    fn accept_locked(store: &mut S, request_id: EdgeId) -> Result<Edge, RelationError> {
        let edge = store
            .update_status_where(
                request_id,
                EdgeStatus::Pending,
                EdgeStatus::Accepted,
                current_timestamp_millis(),
            )
            .map_err(store_error)?
            .ok_or(RelationError::NotFound)?;

        tracing::info!(edge_id = %edge.id, "Friend request accepted: {} <-> {}", edge.requester_id, edge.receiver_id);
        Ok(edge)
    }

    fn decline_locked(store: &mut S, request_id: EdgeId) -> Result<(), RelationError> {
        if !store
            .delete_where(request_id, EdgeStatus::Pending)
            .map_err(store_error)?
        {
            return Err(RelationError::NotFound);
        }

        tracing::info!(edge_id = %request_id, "Friend request declined");
        Ok(())
    }
}
