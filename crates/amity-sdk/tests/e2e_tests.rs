//! End-to-end tests for the Amity SDK
//!
//! Each test serves a real gateway over an in-memory store on an ephemeral
//! port and drives it through `FriendsClient` and `ClientViewModel`.

use amity_domain::{EdgeStatus, FriendStatus, Profile, UserId};
use amity_gateway::{build_state, config::GatewayConfig, serve};
use amity_sdk::{ClientViewModel, FriendsApi, FriendsClient, SdkError};
use amity_store::SqliteStore;
use tokio::net::TcpListener;

struct TestGateway {
    base_url: String,
    state: amity_gateway::handlers::AppState,
}

impl TestGateway {
    async fn start() -> Self {
        let config = GatewayConfig::default_test_config();
        let mut store = SqliteStore::new(":memory:").unwrap();
        store
            .upsert_profile(&Profile::new("alice".into(), "Alice", None))
            .unwrap();
        let state = build_state(&config, store);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener, state.clone()));

        Self { base_url, state }
    }

    fn client(&self, user: &str) -> FriendsClient {
        let token = self.state.verifier.issue_token(&user.into()).unwrap();
        FriendsClient::new(&self.base_url, token)
    }

    fn view_model(&self, user: &str) -> ClientViewModel<FriendsClient> {
        ClientViewModel::new(self.client(user), UserId::from(user))
    }
}

#[tokio::test]
async fn test_request_accept_remove_scenario() {
    let gateway = TestGateway::start().await;
    let mut alice = gateway.view_model("alice");
    let mut bob = gateway.view_model("bob");
    let bob_id = UserId::from("bob");
    let alice_id = UserId::from("alice");

    assert_eq!(alice.send_request(&bob_id).await.unwrap(), FriendStatus::PendingSent);
    assert!(alice.status_view(&bob_id).edge_id.is_some());

    bob.refresh().await.unwrap();
    assert_eq!(bob.pending_requests().len(), 1);
    assert_eq!(bob.pending_requests()[0].requester.display_name, "Alice");
    assert_eq!(bob.status(&alice_id), FriendStatus::PendingReceived);

    let request_id = bob.pending_requests()[0].id;
    let edge = bob.accept(request_id).await.unwrap();
    assert_eq!(edge.status, EdgeStatus::Accepted);
    assert!(bob.pending_requests().is_empty());
    assert_eq!(bob.friends().len(), 1);
    assert_eq!(bob.status(&alice_id), FriendStatus::Friends);

    assert_eq!(alice.refresh_status(&bob_id).await.unwrap(), FriendStatus::Friends);

    alice.refresh().await.unwrap();
    alice.remove_friend(request_id).await.unwrap();
    assert!(alice.friends().is_empty());
    assert_eq!(alice.status(&bob_id), FriendStatus::None);

    assert_eq!(bob.refresh_status(&alice_id).await.unwrap(), FriendStatus::None);
}

#[tokio::test]
async fn test_reverse_send_is_absorbed_by_view_model() {
    let gateway = TestGateway::start().await;
    let mut alice = gateway.view_model("alice");
    let mut bob = gateway.view_model("bob");

    alice.send_request(&"bob".into()).await.unwrap();

    // The gateway rejects bob's send with 409; the view model keeps pending_sent
    let status = bob.send_request(&"alice".into()).await.unwrap();
    assert_eq!(status, FriendStatus::PendingSent);

    // Server truth replaces it on the next refresh
    bob.refresh().await.unwrap();
    assert_eq!(bob.status(&"alice".into()), FriendStatus::PendingReceived);
}

#[tokio::test]
async fn test_self_request_reverts() {
    let gateway = TestGateway::start().await;
    let mut alice = gateway.view_model("alice");

    let result = alice.send_request(&"alice".into()).await;
    assert!(matches!(result, Err(SdkError::SelfRelation)));
    assert_eq!(alice.status(&"alice".into()), FriendStatus::None);
}

#[tokio::test]
async fn test_double_accept_is_not_found() {
    let gateway = TestGateway::start().await;
    let alice = gateway.client("alice");
    let bob = gateway.client("bob");

    let edge = alice.send_request(&"bob".into()).await.unwrap();
    bob.respond(edge.id, amity_domain::RequestAction::Accept)
        .await
        .unwrap();

    let again = bob
        .respond(edge.id, amity_domain::RequestAction::Decline)
        .await;
    assert!(matches!(again, Err(SdkError::NotFound(_))));
}

#[tokio::test]
async fn test_decline_cancels_for_both_sides() {
    let gateway = TestGateway::start().await;
    let mut alice = gateway.view_model("alice");
    let mut bob = gateway.view_model("bob");

    alice.send_request(&"bob".into()).await.unwrap();
    bob.refresh().await.unwrap();
    let request_id = bob.pending_requests()[0].id;

    bob.decline(request_id).await.unwrap();
    assert!(bob.pending_requests().is_empty());
    assert_eq!(bob.status(&"alice".into()), FriendStatus::None);

    assert_eq!(alice.refresh_status(&"bob".into()).await.unwrap(), FriendStatus::None);
}

#[tokio::test]
async fn test_unfriend_by_user_id() {
    let gateway = TestGateway::start().await;
    let alice = gateway.client("alice");
    let bob = gateway.client("bob");

    let edge = alice.send_request(&"bob".into()).await.unwrap();
    bob.respond(edge.id, amity_domain::RequestAction::Accept)
        .await
        .unwrap();

    bob.unfriend(&"alice".into()).await.unwrap();
    assert!(alice.friends().await.unwrap().is_empty());
    assert!(matches!(
        bob.unfriend(&"alice".into()).await,
        Err(SdkError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_invalid_token_is_auth_error() {
    let gateway = TestGateway::start().await;
    let client = FriendsClient::new(&gateway.base_url, "not-a-jwt");

    let result = client.pending_requests().await;
    assert!(matches!(result, Err(SdkError::AuthError(_))));
}

#[tokio::test]
async fn test_remove_friend_before_lists_are_loaded() {
    let gateway = TestGateway::start().await;
    let mut alice = gateway.view_model("alice");
    let bob = gateway.client("bob");
    let bob_id = UserId::from("bob");

    let edge = gateway.client("alice").send_request(&bob_id).await.unwrap();
    bob.respond(edge.id, amity_domain::RequestAction::Accept)
        .await
        .unwrap();

    // Only the status is known locally; the friend list was never fetched
    assert_eq!(alice.refresh_status(&bob_id).await.unwrap(), FriendStatus::Friends);
    assert!(alice.friends().is_empty());

    alice.remove_friend(edge.id).await.unwrap();
    assert_eq!(alice.status(&bob_id), FriendStatus::None);
    assert_eq!(alice.status_view(&bob_id).edge_id, None);
}

#[tokio::test]
async fn test_user_ids_with_reserved_characters() {
    let gateway = TestGateway::start().await;
    let alice = gateway.client("alice");
    let bob = gateway.client("bob");

    let edge = alice.send_request(&"bob".into()).await.unwrap();

    // "b%6Fb" is its own user id, not an escaped "bob"
    let view = alice.status(&"b%6Fb".into()).await.unwrap();
    assert_eq!(view.status, FriendStatus::None);
    assert_eq!(
        alice.status(&"bob".into()).await.unwrap().status,
        FriendStatus::PendingSent
    );

    let view = alice.status(&"x/y".into()).await.unwrap();
    assert_eq!(view.status, FriendStatus::None);

    bob.respond(edge.id, amity_domain::RequestAction::Accept)
        .await
        .unwrap();
    assert!(matches!(
        alice.unfriend(&"b%6Fb".into()).await,
        Err(SdkError::NotFound(_))
    ));
    assert_eq!(alice.friends().await.unwrap().len(), 1);
}
