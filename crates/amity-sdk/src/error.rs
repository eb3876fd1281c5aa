//! Error types for the Amity SDK.

use serde::Deserialize;
use thiserror::Error;

/// SDK operation errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Sender and receiver are the same user (HTTP 400)
    #[error("Cannot send a friend request to yourself")]
    SelfRelation,

    /// An edge already exists between the two users (HTTP 409)
    #[error("A relationship between these users already exists")]
    DuplicateRelation,

    /// The edge is missing or no longer in the expected state (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller is not a participant of the edge (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing, invalid or expired bearer token (HTTP 401)
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Too many friend requests (HTTP 429)
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited {
        /// Value of the `Retry-After` header, when present
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success response
    #[error("Gateway error (HTTP {status}): {message}")]
    GatewayError {
        /// HTTP status code
        status: u16,
        /// Message from the error body, or the raw body text
        message: String,
    },

    /// Connection error (network, DNS, timeout, etc.)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Error body returned by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Stable error name, e.g. "DuplicateRelationError"
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl SdkError {
    /// Map a non-success response onto the error taxonomy
    ///
    /// The error name in the body wins over the status code when both are
    /// available, so a gateway behind a proxy that rewrites status codes
    /// still yields the right variant.
    pub fn from_response(status: u16, body: Option<ErrorBody>, retry_after_secs: Option<u64>) -> Self {
        let name = body.as_ref().map(|b| b.error.as_str());
        let message = body
            .as_ref()
            .map(|b| b.message.clone())
            .unwrap_or_default();

        match (name, status) {
            (Some("SelfRelationError"), _) | (None, 400) => SdkError::SelfRelation,
            (Some("DuplicateRelationError"), _) | (None, 409) => SdkError::DuplicateRelation,
            (Some("NotFoundError"), _) | (None, 404) => SdkError::NotFound(message),
            (Some("ForbiddenError"), _) | (None, 403) => SdkError::Forbidden(message),
            (_, 401) => SdkError::AuthError(message),
            (_, 429) => SdkError::RateLimited { retry_after_secs },
            _ => SdkError::GatewayError { status, message },
        }
    }

    /// Whether this is the 409 a repeated send produces
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SdkError::DuplicateRelation)
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SdkError::DecodeError(e.to_string())
        } else {
            SdkError::ConnectionError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::DecodeError(format!("JSON parsing error: {}", e))
    }
}
