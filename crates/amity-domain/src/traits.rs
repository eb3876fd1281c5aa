//! Trait definitions for external interactions
//!
//! These traits define the boundary between relationship rules and
//! persistence. Infrastructure implementations live in other crates.

use crate::{Edge, EdgeId, EdgeStatus, Friend, FriendRequest, UserId};
use std::fmt::Display;

/// Classification every store error must provide
pub trait StoreFailure: Display {
    /// True when the store rejected a write because it would violate
    /// the one-edge-per-pair constraint
    fn is_conflict(&self) -> bool;
}

/// Trait for storing and retrieving relationship edges
///
/// Implemented by the infrastructure layer (amity-store).
///
/// Every mutation is predicated on the row's current status. Implementations
/// must apply the predicate and the write as one atomic step, so that of two
/// racing transitions on the same edge at most one takes effect.
pub trait RelationshipStore {
    /// Error type for store operations
    type Error: StoreFailure;

    /// Insert a new edge
    fn insert(&mut self, edge: Edge) -> Result<Edge, Self::Error>;

    /// Get an edge by ID
    fn find_by_id(&self, id: EdgeId) -> Result<Option<Edge>, Self::Error>;

    /// Get the edge joining two users, in either direction
    fn find_by_pair(&self, a: &UserId, b: &UserId) -> Result<Option<Edge>, Self::Error>;

    /// Pending requests received by `user`, newest first, joined with the
    /// requester's profile
    fn list_pending_for_receiver(&self, user: &UserId) -> Result<Vec<FriendRequest>, Self::Error>;

    /// Accepted edges involving `user`, most recently accepted first, joined
    /// with the other participant's profile
    fn list_accepted_for(&self, user: &UserId) -> Result<Vec<Friend>, Self::Error>;

    /// Set `new` status only if the edge currently has `expected` status
    ///
    /// Returns the updated edge, or `None` when no row matched.
    fn update_status_where(
        &mut self,
        id: EdgeId,
        expected: EdgeStatus,
        new: EdgeStatus,
        now: u64,
    ) -> Result<Option<Edge>, Self::Error>;

    /// Delete the edge only if it currently has `expected` status
    fn delete_where(&mut self, id: EdgeId, expected: EdgeStatus) -> Result<bool, Self::Error>;

    /// Delete the pair's edge only if it currently has `expected` status
    fn delete_by_pair_where(
        &mut self,
        a: &UserId,
        b: &UserId,
        expected: EdgeStatus,
    ) -> Result<bool, Self::Error>;
}
