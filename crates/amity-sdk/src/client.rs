//! HTTP client for the friends API.

use crate::error::{ErrorBody, SdkError};
use amity_domain::{Edge, EdgeId, Friend, FriendRequest, RequestAction, StatusView, UserId};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Response, Url};
use serde::Serialize;

/// Operations the gateway exposes to a signed-in user
///
/// Every call acts as the user whose token the implementation carries.
#[async_trait]
pub trait FriendsApi: Send + Sync {
    /// `POST /friends`
    async fn send_request(&self, receiver: &UserId) -> Result<Edge, SdkError>;

    /// `PATCH /friends/:id`
    async fn respond(&self, request_id: EdgeId, action: RequestAction) -> Result<Edge, SdkError>;

    /// `DELETE /friends/:id`
    async fn remove_friend(&self, friendship_id: EdgeId) -> Result<(), SdkError>;

    /// `DELETE /friends/users/:userId`
    async fn unfriend(&self, other: &UserId) -> Result<(), SdkError>;

    /// `GET /friends/requests`
    async fn pending_requests(&self) -> Result<Vec<FriendRequest>, SdkError>;

    /// `GET /friends`
    async fn friends(&self) -> Result<Vec<Friend>, SdkError>;

    /// `GET /friends/status/:userId`
    async fn status(&self, other: &UserId) -> Result<StatusView, SdkError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequestBody<'a> {
    receiver_id: &'a UserId,
}

#[derive(Serialize)]
struct RespondBody {
    action: RequestAction,
}

/// Amity friends client
pub struct FriendsClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FriendsClient {
    /// Create a client for the gateway at `base_url` acting with `token`
    pub fn new(base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Join `segments` onto the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url, SdkError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SdkError::ConnectionError(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                SdkError::ConnectionError(format!("Base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<reqwest::RequestBuilder, SdkError> {
        Ok(self.http_client.get(self.url(segments)?).bearer_auth(&self.token))
    }

    /// Turn a non-success response into a typed error
    async fn check(response: Response) -> Result<Response, SdkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();

        let error = match body {
            Some(body) => SdkError::from_response(status.as_u16(), Some(body), retry_after),
            None if status.is_server_error() => SdkError::GatewayError {
                status: status.as_u16(),
                message: text,
            },
            None => SdkError::from_response(status.as_u16(), None, retry_after),
        };
        tracing::debug!("Gateway returned {}: {}", status, error);
        Err(error)
    }
}

#[async_trait]
impl FriendsApi for FriendsClient {
    async fn send_request(&self, receiver: &UserId) -> Result<Edge, SdkError> {
        let response = self
            .http_client
            .post(self.url(&["friends"])?)
            .bearer_auth(&self.token)
            .json(&SendRequestBody { receiver_id: receiver })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn respond(&self, request_id: EdgeId, action: RequestAction) -> Result<Edge, SdkError> {
        let id = request_id.to_string();
        let response = self
            .http_client
            .patch(self.url(&["friends", id.as_str()])?)
            .bearer_auth(&self.token)
            .json(&RespondBody { action })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn remove_friend(&self, friendship_id: EdgeId) -> Result<(), SdkError> {
        let id = friendship_id.to_string();
        let response = self
            .http_client
            .delete(self.url(&["friends", id.as_str()])?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn unfriend(&self, other: &UserId) -> Result<(), SdkError> {
        let response = self
            .http_client
            .delete(self.url(&["friends", "users", other.as_str()])?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn pending_requests(&self) -> Result<Vec<FriendRequest>, SdkError> {
        let response = self.get(&["friends", "requests"])?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn friends(&self) -> Result<Vec<Friend>, SdkError> {
        let response = self.get(&["friends"])?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn status(&self, other: &UserId) -> Result<StatusView, SdkError> {
        let response = self.get(&["friends", "status", other.as_str()])?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
