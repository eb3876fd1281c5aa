//! Read projections joining edges with profile data

use crate::edge::{EdgeId, UserId};
use serde::{Deserialize, Serialize};

/// Public profile summary of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// User identifier
    pub id: UserId,

    /// Name shown to other users
    pub display_name: String,

    /// Avatar image location, if the user set one
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Create a profile
    pub fn new(id: UserId, display_name: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url,
        }
    }

    /// Profile used when the projection has no row for the user
    pub fn fallback(id: UserId) -> Self {
        let display_name = id.as_str().to_string();
        Self {
            id,
            display_name,
            avatar_url: None,
        }
    }
}

/// Incoming pending request, as seen by its receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    /// Edge id, used to accept or decline
    pub id: EdgeId,

    /// Who sent the request
    pub requester: Profile,

    /// When the request was sent (Unix epoch milliseconds)
    pub created_at: u64,
}

/// Accepted relationship, as seen by one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    /// Edge id, used to remove the friendship
    pub friendship_id: EdgeId,

    /// The other participant
    pub user: Profile,

    /// When the request was accepted (Unix epoch milliseconds)
    pub since: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_uses_id_as_name() {
        let profile = Profile::fallback("u-9".into());
        assert_eq!(profile.display_name, "u-9");
        assert!(profile.avatar_url.is_none());
    }

    #[test]
    fn test_friend_request_wire_format() {
        let request = FriendRequest {
            id: EdgeId::from_value(7),
            requester: Profile::new("u-1".into(), "Ada", Some("https://img/ada.png".into())),
            created_at: 100,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["requester"]["displayName"], "Ada");
        assert_eq!(json["requester"]["avatarUrl"], "https://img/ada.png");
        assert_eq!(json["createdAt"], 100);
    }
}
