//! HTTP request handlers for the Gateway.
//!
//! Maps the relationship service onto REST routes using axum. Every
//! `/friends` route acts as the user named by the bearer token.

use crate::identity::{AuthUser, IdentityError, TokenVerifier};
use crate::rate_limit::{RateLimitExceeded, RateLimiter};
use amity_domain::{Edge, EdgeId, Friend, FriendRequest, RequestAction, StatusView, UserId};
use amity_service::{RelationError, RelationshipService};
use amity_store::SqliteStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Relationship rules over the SQLite store
    pub service: Arc<RelationshipService<SqliteStore>>,
    /// Bearer-token verification
    pub verifier: Arc<TokenVerifier>,
    /// Limit on sent friend requests
    pub rate_limiter: Arc<RateLimiter>,
}

/// Body of `POST /friends`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    /// User the request is addressed to
    pub receiver_id: UserId,
}

/// Body of `PATCH /friends/:id`
#[derive(Debug, Deserialize)]
pub struct RespondBody {
    /// accept or decline
    pub action: RequestAction,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error name (e.g. "DuplicateRelationError")
    pub error: String,
    /// Human-readable message
    pub message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Relationship rule violation or storage failure
    Relation(RelationError),
    /// Missing or invalid bearer token
    Unauthorized(IdentityError),
    /// Friend-request rate limit reached
    RateLimited(RateLimitExceeded),
    /// Malformed path parameter or request body
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, name, message) = match &self {
            AppError::Relation(e) => {
                let status = match e {
                    RelationError::SelfRelation => StatusCode::BAD_REQUEST,
                    RelationError::DuplicateRelation => StatusCode::CONFLICT,
                    RelationError::NotFound => StatusCode::NOT_FOUND,
                    RelationError::Forbidden => StatusCode::FORBIDDEN,
                    RelationError::Store(detail) => {
                        tracing::error!("Store failure: {}", detail);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = match e {
                    RelationError::Store(_) => "Internal server error".to_string(),
                    other => other.to_string(),
                };
                (status, e.name(), message)
            }
            AppError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, "Unauthorized", e.to_string()),
            AppError::RateLimited(e) => (StatusCode::TOO_MANY_REQUESTS, "RateLimited", e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg.clone()),
        };

        let body = Json(ErrorResponse {
            error: name.to_string(),
            message,
        });
        let mut response = (status, body).into_response();

        if let AppError::RateLimited(e) = &self {
            let secs = e.retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<RelationError> for AppError {
    fn from(e: RelationError) -> Self {
        AppError::Relation(e)
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        AppError::Unauthorized(e)
    }
}

impl From<RateLimitExceeded> for AppError {
    fn from(e: RateLimitExceeded) -> Self {
        AppError::RateLimited(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection);
        AppError::BadRequest(rejection.body_text())
    }
}

fn parse_edge_id(raw: &str) -> Result<EdgeId, AppError> {
    EdgeId::from_string(raw).map_err(AppError::BadRequest)
}

/// POST /friends - Send a friend request
async fn send_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<SendRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Edge>), AppError> {
    let Json(body) = body?;
    state.rate_limiter.check(&user)?;
    let edge = state.service.send_request(&user, &body.receiver_id)?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// PATCH /friends/:id - Accept or decline a pending request
async fn respond_to_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<RespondBody>, JsonRejection>,
) -> Result<Json<Edge>, AppError> {
    let id = parse_edge_id(&id)?;
    let Json(body) = body?;
    let edge = state.service.respond_to_request(&user, id, body.action)?;
    Ok(Json(edge))
}

/// DELETE /friends/:id - Remove an accepted friendship
async fn remove_friend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_edge_id(&id)?;
    state.service.remove_friend(id, &user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /friends/users/:user_id - Remove a friendship by the other user's id
async fn unfriend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(other): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.unfriend(&user, &UserId::new(other))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /friends/requests - Pending requests received by the caller
async fn pending_requests(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<FriendRequest>>, AppError> {
    Ok(Json(state.service.get_pending_requests(&user)?))
}

/// GET /friends - The caller's friends
async fn list_friends(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Friend>>, AppError> {
    Ok(Json(state.service.list_friends(&user)?))
}

/// GET /friends/status/:user_id - The caller's status towards another user
async fn friend_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(other): Path<String>,
) -> Result<Json<StatusView>, AppError> {
    Ok(Json(state.service.get_status_view(&user, &UserId::new(other))?))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/friends", get(list_friends).post(send_request))
        .route("/friends/requests", get(pending_requests))
        .route("/friends/status/:user_id", get(friend_status))
        .route("/friends/users/:user_id", delete(unfriend))
        .route("/friends/:id", patch(respond_to_request).delete(remove_friend))
        .route("/health", get(health_check))
        .with_state(state)
}
