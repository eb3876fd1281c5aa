//! Error types for relationship operations

use thiserror::Error;

/// Errors that can occur during relationship operations
///
/// Every variant except `Store` is part of the public contract and maps to
/// exactly one response status at the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    /// Requester and receiver are the same user
    #[error("Cannot create a relationship with yourself")]
    SelfRelation,

    /// An edge already exists for the pair, in any status or direction
    #[error("A relationship already exists between these users")]
    DuplicateRelation,

    /// No edge matched, or it was not in the required status
    #[error("Relationship not found")]
    NotFound,

    /// The acting user may not perform this transition
    #[error("Not permitted to modify this relationship")]
    Forbidden,

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),
}

impl RelationError {
    /// Stable error name exposed to clients
    pub fn name(&self) -> &'static str {
        match self {
            RelationError::SelfRelation => "SelfRelationError",
            RelationError::DuplicateRelation => "DuplicateRelationError",
            RelationError::NotFound => "NotFoundError",
            RelationError::Forbidden => "ForbiddenError",
            RelationError::Store(_) => "InternalError",
        }
    }
}
