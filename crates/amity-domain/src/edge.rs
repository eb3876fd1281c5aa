//! Edge module - the single stored record joining two users

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an edge based on UUIDv7
///
/// UUIDv7 values sort chronologically, which the store relies on to break
/// ties between edges created in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EdgeId(u128);

impl EdgeId {
    /// Generate a new UUIDv7-based EdgeId
    ///
    /// # Examples
    ///
    /// ```
    /// use amity_domain::EdgeId;
    ///
    /// let id = EdgeId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EdgeId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EdgeId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use amity_domain::EdgeId;
    ///
    /// let id = EdgeId::new();
    /// let parsed = EdgeId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid edge id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<EdgeId> for String {
    fn from(id: EdgeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EdgeId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EdgeId::from_string(&value)
    }
}

/// Opaque user identifier supplied by the identity provider
///
/// No structure is assumed; two ids are the same user iff the strings match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identity-provider user id
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stored status of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    /// Request sent, awaiting the receiver's answer
    Pending,

    /// Both users are friends
    Accepted,

    /// Representable but never created by any operation
    Blocked,
}

impl EdgeStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Accepted => "accepted",
            EdgeStatus::Blocked => "blocked",
        }
    }

    /// Parse a stored status name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EdgeStatus::Pending),
            "accepted" => Some(EdgeStatus::Accepted),
            "blocked" => Some(EdgeStatus::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    /// Move the edge to accepted
    Accept,

    /// Delete the pending edge
    Decline,
}

/// A relationship edge between two users
///
/// At most one edge exists per unordered pair of users, and an edge never
/// joins a user to themselves. Both are enforced by the service layer and
/// backstopped by the store schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,

    /// User who sent the request
    pub requester_id: UserId,

    /// User who received the request
    pub receiver_id: UserId,

    /// Current stored status
    pub status: EdgeStatus,

    /// Creation time (Unix epoch milliseconds)
    pub created_at: u64,

    /// Last status change (Unix epoch milliseconds)
    pub updated_at: u64,
}

impl Edge {
    /// Create a fresh pending edge
    pub fn pending(requester_id: UserId, receiver_id: UserId, now: u64) -> Self {
        Self {
            id: EdgeId::new(),
            requester_id,
            receiver_id,
            status: EdgeStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user is one of the two participants
    pub fn involves(&self, user: &UserId) -> bool {
        &self.requester_id == user || &self.receiver_id == user
    }

    /// The participant that is not `user`, if `user` participates at all
    pub fn counterpart(&self, user: &UserId) -> Option<&UserId> {
        if &self.requester_id == user {
            Some(&self.receiver_id)
        } else if &self.receiver_id == user {
            Some(&self.requester_id)
        } else {
            None
        }
    }
}
