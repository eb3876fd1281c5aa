//! Amity Gateway
//!
//! REST contract for the friend-relationship lifecycle.
//!
//! | Route | Success | Errors |
//! |-------|---------|--------|
//! | `POST /friends {receiverId}` | 201 Edge | 400 self, 409 duplicate, 429 |
//! | `PATCH /friends/:id {action}` | 200 Edge | 403, 404 |
//! | `DELETE /friends/:id` | 204 | 403, 404 |
//! | `GET /friends/requests` | 200 FriendRequest[] | |
//! | `GET /friends` | 200 Friend[] | |
//! | `GET /friends/status/:userId` | 200 StatusView | |
//! | `DELETE /friends/users/:userId` | 204 | 404 |
//!
//! All `/friends` routes require a bearer token (401 otherwise).

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod identity;
pub mod rate_limit;

use amity_service::RelationshipService;
use amity_store::{SqliteStore, StoreError};
use config::GatewayConfig;
use handlers::{create_router, AppState};
use identity::TokenVerifier;
use rate_limit::RateLimiter;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::info;

/// Gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the shared state from configuration and an opened store
///
/// This is the composition root: the service, verifier and rate limiter
/// are constructed here and handed to handlers by reference.
pub fn build_state(config: &GatewayConfig, store: SqliteStore) -> AppState {
    AppState {
        service: Arc::new(RelationshipService::new(Arc::new(Mutex::new(store)))),
        verifier: Arc::new(TokenVerifier::new(
            &config.jwt_secret,
            config.token_expiry_secs,
        )),
        rate_limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
    }
}

/// Serve the gateway on an already-bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), GatewayError> {
    let app = create_router(state);

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))
}

/// Start the Gateway HTTP server
///
/// Opens the store, builds the shared state, and serves until the process
/// exits.
pub async fn start_server(config: GatewayConfig) -> Result<(), GatewayError> {
    info!("Starting Amity Gateway");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!(
        "Rate limit: {} requests per {}s, up to {} users tracked",
        config.rate_limit.max_requests,
        config.rate_limit.window_secs,
        config.rate_limit.max_tracked_users
    );

    let store = SqliteStore::new(&config.database_path)?;
    let state = build_state(&config, store);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Gateway listening on {}", config.bind_addr());

    serve(listener, state).await
}
