//! Client-side relationship state with optimistic sends.
//!
//! The view model holds a best-effort local copy of what the signed-in user
//! sees: a status per other user, the incoming requests and the friend
//! list. Server responses always win over local state.

use crate::client::FriendsApi;
use crate::error::SdkError;
use amity_domain::{Edge, EdgeId, Friend, FriendRequest, FriendStatus, RequestAction, StatusView, UserId};
use std::collections::HashMap;
use tracing::{debug, warn};

const NO_RELATION: StatusView = StatusView {
    status: FriendStatus::None,
    edge_id: None,
};

/// Local relationship state for one signed-in user
pub struct ClientViewModel<A: FriendsApi> {
    api: A,
    me: UserId,
    statuses: HashMap<UserId, StatusView>,
    pending: Vec<FriendRequest>,
    friends: Vec<Friend>,
}

impl<A: FriendsApi> ClientViewModel<A> {
    /// Create an empty view model for `me`
    pub fn new(api: A, me: UserId) -> Self {
        Self {
            api,
            me,
            statuses: HashMap::new(),
            pending: Vec::new(),
            friends: Vec::new(),
        }
    }

    /// The underlying API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Locally known status towards `other` (`none` when unknown)
    pub fn status(&self, other: &UserId) -> FriendStatus {
        self.status_view(other).status
    }

    /// Locally known status and edge id towards `other`
    pub fn status_view(&self, other: &UserId) -> StatusView {
        self.statuses.get(other).copied().unwrap_or(NO_RELATION)
    }

    /// Incoming pending requests as of the last fetch
    pub fn pending_requests(&self) -> &[FriendRequest] {
        &self.pending
    }

    /// Friends as of the last fetch
    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// Send a friend request, showing `pending_sent` before the call resolves
    ///
    /// A 409 from the gateway is absorbed: the pair already has an edge, so
    /// the local `pending_sent` stays until the next refresh replaces it.
    /// Any other failure restores the status held before the call.
    pub async fn send_request(&mut self, receiver: &UserId) -> Result<FriendStatus, SdkError> {
        let prior = self.statuses.get(receiver).copied();
        self.statuses.insert(
            receiver.clone(),
            StatusView {
                status: FriendStatus::PendingSent,
                edge_id: None,
            },
        );

        match self.api.send_request(receiver).await {
            Ok(edge) => {
                self.statuses.insert(
                    receiver.clone(),
                    StatusView {
                        status: FriendStatus::PendingSent,
                        edge_id: Some(edge.id),
                    },
                );
                Ok(FriendStatus::PendingSent)
            }
            Err(e) if e.is_duplicate() => {
                debug!("Request to {} already exists, keeping pending_sent", receiver);
                self.statuses.insert(
                    receiver.clone(),
                    StatusView {
                        status: FriendStatus::PendingSent,
                        edge_id: prior.and_then(|view| view.edge_id),
                    },
                );
                Ok(FriendStatus::PendingSent)
            }
            Err(e) => {
                warn!("Friend request to {} failed, reverting: {}", receiver, e);
                match prior {
                    Some(view) => self.statuses.insert(receiver.clone(), view),
                    None => self.statuses.remove(receiver),
                };
                Err(e)
            }
        }
    }

    /// Accept an incoming request, then refetch the lists
    pub async fn accept(&mut self, request_id: EdgeId) -> Result<Edge, SdkError> {
        let result = self.api.respond(request_id, RequestAction::Accept).await;
        if let Ok(edge) = &result {
            self.adopt(edge);
        }
        self.reload_lists().await;
        result
    }

    /// Decline (or cancel) a pending request, then refetch the lists
    pub async fn decline(&mut self, request_id: EdgeId) -> Result<(), SdkError> {
        let result = self.api.respond(request_id, RequestAction::Decline).await;
        if let Ok(edge) = &result {
            if let Some(other) = edge.counterpart(&self.me) {
                self.statuses.insert(other.clone(), NO_RELATION);
            }
        }
        self.reload_lists().await;
        result.map(|_| ())
    }

    /// Remove a friendship, then refetch the lists and the friend's status
    ///
    /// The friend is looked up in both the friend list and the status
    /// entries, so the status is re-read even when the list was never loaded.
    pub async fn remove_friend(&mut self, friendship_id: EdgeId) -> Result<(), SdkError> {
        let mut others: Vec<UserId> = self
            .friends
            .iter()
            .filter(|f| f.friendship_id == friendship_id)
            .map(|f| f.user.id.clone())
            .collect();
        for (user, view) in &self.statuses {
            if view.edge_id == Some(friendship_id) && !others.contains(user) {
                others.push(user.clone());
            }
        }

        let result = self.api.remove_friend(friendship_id).await;
        self.reload_lists().await;

        for other in others {
            if let Err(e) = self.refresh_status(&other).await {
                warn!("Could not refresh status for {}: {}", other, e);
                if result.is_ok() {
                    self.statuses.insert(other, NO_RELATION);
                }
            }
        }
        result
    }

    /// Replace the local status towards `other` with the server's
    pub async fn refresh_status(&mut self, other: &UserId) -> Result<FriendStatus, SdkError> {
        let view = self.api.status(other).await?;
        debug!("Server status towards {}: {}", other, view.status);
        self.statuses.insert(other.clone(), view);
        Ok(view.status)
    }

    /// Replace all local state with the server's
    pub async fn refresh(&mut self) -> Result<(), SdkError> {
        let pending = self.api.pending_requests().await?;
        let friends = self.api.friends().await?;

        let mut statuses = HashMap::new();
        let known: Vec<UserId> = self.statuses.keys().cloned().collect();
        for other in known {
            let view = self.api.status(&other).await?;
            statuses.insert(other, view);
        }
        for request in &pending {
            statuses.insert(
                request.requester.id.clone(),
                StatusView {
                    status: FriendStatus::PendingReceived,
                    edge_id: Some(request.id),
                },
            );
        }
        for friend in &friends {
            statuses.insert(
                friend.user.id.clone(),
                StatusView {
                    status: FriendStatus::Friends,
                    edge_id: Some(friend.friendship_id),
                },
            );
        }

        self.pending = pending;
        self.friends = friends;
        self.statuses = statuses;
        Ok(())
    }

    fn adopt(&mut self, edge: &Edge) {
        if let Some(other) = edge.counterpart(&self.me) {
            self.statuses
                .insert(other.clone(), StatusView::from_edge(Some(edge), &self.me));
        }
    }

    /// Refetch both lists; failures leave the previous lists in place
    async fn reload_lists(&mut self) {
        match self.api.pending_requests().await {
            Ok(pending) => self.pending = pending,
            Err(e) => warn!("Failed to refetch pending requests: {}", e),
        }
        match self.api.friends().await {
            Ok(friends) => self.friends = friends,
            Err(e) => warn!("Failed to refetch friends: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amity_domain::{EdgeStatus, Profile};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory API that records calls and fails on demand
    #[derive(Default)]
    struct FakeApi {
        send_failure: Option<u16>,
        respond_failure: Option<u16>,
        list_failure: bool,
        pending: Vec<FriendRequest>,
        friends: Mutex<Vec<Friend>>,
        statuses: HashMap<UserId, StatusView>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FriendsApi for FakeApi {
        async fn send_request(&self, receiver: &UserId) -> Result<Edge, SdkError> {
            self.record("send");
            match self.send_failure {
                Some(code) => Err(SdkError::from_response(code, None, None)),
                None => Ok(Edge::pending("me".into(), receiver.clone(), 1)),
            }
        }

        async fn respond(&self, request_id: EdgeId, action: RequestAction) -> Result<Edge, SdkError> {
            self.record("respond");
            if let Some(code) = self.respond_failure {
                return Err(SdkError::from_response(code, None, None));
            }
            let mut edge = Edge::pending("u-2".into(), "me".into(), 1);
            edge.id = request_id;
            if action == RequestAction::Accept {
                edge.status = EdgeStatus::Accepted;
            }
            Ok(edge)
        }

        async fn remove_friend(&self, friendship_id: EdgeId) -> Result<(), SdkError> {
            self.record("remove");
            self.friends
                .lock()
                .unwrap()
                .retain(|f| f.friendship_id != friendship_id);
            Ok(())
        }

        async fn unfriend(&self, _other: &UserId) -> Result<(), SdkError> {
            self.record("unfriend");
            Ok(())
        }

        async fn pending_requests(&self) -> Result<Vec<FriendRequest>, SdkError> {
            self.record("pending");
            if self.list_failure {
                return Err(SdkError::ConnectionError("down".into()));
            }
            Ok(self.pending.clone())
        }

        async fn friends(&self) -> Result<Vec<Friend>, SdkError> {
            self.record("friends");
            if self.list_failure {
                return Err(SdkError::ConnectionError("down".into()));
            }
            Ok(self.friends.lock().unwrap().clone())
        }

        async fn status(&self, other: &UserId) -> Result<StatusView, SdkError> {
            self.record("status");
            Ok(self.statuses.get(other).copied().unwrap_or(NO_RELATION))
        }
    }

    fn view_model(api: FakeApi) -> ClientViewModel<FakeApi> {
        ClientViewModel::new(api, "me".into())
    }

    fn friend(id: EdgeId, user: &str) -> Friend {
        Friend {
            friendship_id: id,
            user: Profile::fallback(user.into()),
            since: 5,
        }
    }

    #[tokio::test]
    async fn test_send_adopts_server_edge_id() {
        let mut vm = view_model(FakeApi::default());
        let other = UserId::from("u-2");

        let status = vm.send_request(&other).await.unwrap();
        assert_eq!(status, FriendStatus::PendingSent);

        let view = vm.status_view(&other);
        assert_eq!(view.status, FriendStatus::PendingSent);
        assert!(view.edge_id.is_some());
    }

    #[tokio::test]
    async fn test_send_conflict_keeps_pending_sent() {
        let mut vm = view_model(FakeApi {
            send_failure: Some(409),
            ..Default::default()
        });
        let other = UserId::from("u-2");

        assert_eq!(vm.send_request(&other).await.unwrap(), FriendStatus::PendingSent);
        assert_eq!(vm.status(&other), FriendStatus::PendingSent);
    }

    #[tokio::test]
    async fn test_send_failure_reverts_to_prior_status() {
        let mut vm = view_model(FakeApi {
            send_failure: Some(500),
            ..Default::default()
        });
        let other = UserId::from("u-2");

        let result = vm.send_request(&other).await;
        assert!(matches!(result, Err(SdkError::GatewayError { status: 500, .. })));
        assert_eq!(vm.status(&other), FriendStatus::None);
    }

    #[tokio::test]
    async fn test_send_failure_restores_known_status() {
        let mut vm = view_model(FakeApi {
            send_failure: Some(429),
            ..Default::default()
        });
        let other = UserId::from("u-2");
        let prior = StatusView {
            status: FriendStatus::PendingReceived,
            edge_id: Some(EdgeId::new()),
        };
        vm.statuses.insert(other.clone(), prior);

        assert!(vm.send_request(&other).await.is_err());
        assert_eq!(vm.status_view(&other), prior);
    }

    #[tokio::test]
    async fn test_send_conflict_keeps_known_edge_id() {
        let mut vm = view_model(FakeApi {
            send_failure: Some(409),
            ..Default::default()
        });
        let other = UserId::from("u-2");
        let known = EdgeId::new();
        vm.statuses.insert(
            other.clone(),
            StatusView {
                status: FriendStatus::PendingReceived,
                edge_id: Some(known),
            },
        );

        vm.send_request(&other).await.unwrap();
        let view = vm.status_view(&other);
        assert_eq!(view.status, FriendStatus::PendingSent);
        assert_eq!(view.edge_id, Some(known));
    }

    #[tokio::test]
    async fn test_accept_refetches_lists() {
        let id = EdgeId::new();
        let api = FakeApi {
            friends: Mutex::new(vec![friend(id, "u-2")]),
            ..Default::default()
        };
        let mut vm = view_model(api);

        let edge = vm.accept(id).await.unwrap();
        assert_eq!(edge.status, EdgeStatus::Accepted);
        assert_eq!(vm.api().calls(), vec!["respond", "pending", "friends"]);
        assert_eq!(vm.friends().len(), 1);
        assert_eq!(vm.status(&"u-2".into()), FriendStatus::Friends);
    }

    #[tokio::test]
    async fn test_failed_accept_still_refetches() {
        let mut vm = view_model(FakeApi {
            respond_failure: Some(404),
            ..Default::default()
        });

        let result = vm.accept(EdgeId::new()).await;
        assert!(matches!(result, Err(SdkError::NotFound(_))));
        assert_eq!(vm.api().calls(), vec!["respond", "pending", "friends"]);
    }

    #[tokio::test]
    async fn test_decline_clears_status() {
        let mut vm = view_model(FakeApi::default());
        let other = UserId::from("u-2");
        vm.statuses.insert(
            other.clone(),
            StatusView {
                status: FriendStatus::PendingReceived,
                edge_id: None,
            },
        );

        vm.decline(EdgeId::new()).await.unwrap();
        assert_eq!(vm.status(&other), FriendStatus::None);
    }

    #[tokio::test]
    async fn test_refetch_failure_keeps_previous_lists() {
        let id = EdgeId::new();
        let mut vm = view_model(FakeApi {
            list_failure: true,
            ..Default::default()
        });
        vm.friends = vec![friend(id, "u-2")];

        vm.accept(id).await.unwrap();
        assert_eq!(vm.friends().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_friend_rereads_status() {
        let id = EdgeId::new();
        let mut vm = view_model(FakeApi {
            friends: Mutex::new(vec![friend(id, "u-2")]),
            ..Default::default()
        });
        vm.refresh().await.unwrap();
        assert_eq!(vm.status(&"u-2".into()), FriendStatus::Friends);

        vm.remove_friend(id).await.unwrap();
        assert!(vm.friends().is_empty());
        assert_eq!(vm.status(&"u-2".into()), FriendStatus::None);
        assert_eq!(vm.api().calls().last(), Some(&"status"));
    }

    #[tokio::test]
    async fn test_remove_friend_without_loaded_list() {
        let id = EdgeId::new();
        let mut vm = view_model(FakeApi::default());
        let other = UserId::from("u-2");
        vm.statuses.insert(
            other.clone(),
            StatusView {
                status: FriendStatus::Friends,
                edge_id: Some(id),
            },
        );

        vm.remove_friend(id).await.unwrap();
        assert_eq!(vm.status(&other), FriendStatus::None);
        assert_eq!(vm.api().calls(), vec!["remove", "pending", "friends", "status"]);
    }

    #[tokio::test]
    async fn test_refresh_adopts_server_state() {
        let request_id = EdgeId::new();
        let mut statuses = HashMap::new();
        statuses.insert(
            UserId::from("u-9"),
            StatusView {
                status: FriendStatus::Blocked,
                edge_id: None,
            },
        );
        let mut vm = view_model(FakeApi {
            pending: vec![FriendRequest {
                id: request_id,
                requester: Profile::fallback("u-3".into()),
                created_at: 1,
            }],
            statuses,
            ..Default::default()
        });
        vm.statuses.insert(
            "u-9".into(),
            StatusView {
                status: FriendStatus::PendingSent,
                edge_id: None,
            },
        );

        vm.refresh().await.unwrap();
        assert_eq!(vm.pending_requests().len(), 1);
        assert_eq!(vm.status(&"u-3".into()), FriendStatus::PendingReceived);
        assert_eq!(vm.status_view(&"u-3".into()).edge_id, Some(request_id));
        assert_eq!(vm.status(&"u-9".into()), FriendStatus::Blocked);
    }
}
