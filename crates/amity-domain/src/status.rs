//! Viewer-relative friend status, derived from at most one edge

use crate::edge::{Edge, EdgeId, EdgeStatus, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a relationship looks from one participant's side
///
/// Never persisted. Always recomputed from the stored edge with
/// [`derive_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendStatus {
    /// No edge between the two users
    None,

    /// The viewer sent a request that is still pending
    PendingSent,

    /// The other user sent the viewer a pending request
    PendingReceived,

    /// The request was accepted
    Friends,

    /// The edge is blocked
    Blocked,
}

impl FriendStatus {
    /// Get the status name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::None => "none",
            FriendStatus::PendingSent => "pending_sent",
            FriendStatus::PendingReceived => "pending_received",
            FriendStatus::Friends => "friends",
            FriendStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the viewer's status from the pair's edge
///
/// Total over every `(edge status, viewer is requester)` combination:
///
/// | edge | status |
/// |---|---|
/// | none | `None` |
/// | accepted | `Friends` |
/// | blocked | `Blocked` |
/// | pending, viewer is requester | `PendingSent` |
/// | pending, viewer is not requester | `PendingReceived` |
pub fn derive_status(edge: Option<&Edge>, viewer: &UserId) -> FriendStatus {
    match edge {
        None => FriendStatus::None,
        Some(edge) => match edge.status {
            EdgeStatus::Accepted => FriendStatus::Friends,
            EdgeStatus::Blocked => FriendStatus::Blocked,
            EdgeStatus::Pending if &edge.requester_id == viewer => FriendStatus::PendingSent,
            EdgeStatus::Pending => FriendStatus::PendingReceived,
        },
    }
}

/// Derived status plus the edge it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    /// Viewer-relative status
    pub status: FriendStatus,

    /// Edge the status was derived from, if any
    pub edge_id: Option<EdgeId>,
}

impl StatusView {
    /// Build the view for `viewer` from the pair's edge
    pub fn from_edge(edge: Option<&Edge>, viewer: &UserId) -> Self {
        Self {
            status: derive_status(edge, viewer),
            edge_id: edge.map(|e| e.id),
        }
    }
}
