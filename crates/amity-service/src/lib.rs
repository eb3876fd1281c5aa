//! Amity Relationship Service
//!
//! Rules for the friend-relationship lifecycle on top of any
//! [`RelationshipStore`](amity_domain::traits::RelationshipStore).
//!
//! # Overview
//!
//! The service is responsible for:
//! - **Invariants**: no self-edges, at most one edge per unordered pair
//! - **Guarded transitions**: every accept/decline/remove is a store call
//!   predicated on the current status, so of two racing transitions on the
//!   same edge exactly one succeeds and the other reports `NotFound`
//! - **Status derivation**: the viewer-relative status of a pair
//!
//! ## Transitions
//!
//! | Operation | Requires | Result |
//! |-----------|----------|--------|
//! | `send_request` | no edge for the pair | pending edge |
//! | `accept_request` | pending | accepted edge |
//! | `decline_request` | pending | edge deleted |
//! | `remove_friend` | accepted, caller participates | edge deleted |
//!
//! # Usage
//!
//! ```no_run
//! use amity_service::{RelationError, RelationshipService};
//! use amity_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("amity.db")?;
//! let service = RelationshipService::new(Arc::new(Mutex::new(store)));
//!
//! let edge = service.send_request(&"u-1".into(), &"u-2".into())?;
//! assert!(matches!(
//!     service.send_request(&"u-2".into(), &"u-1".into()),
//!     Err(RelationError::DuplicateRelation)
//! ));
//! service.decline_request(edge.id)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod service;

pub use error::RelationError;
pub use service::RelationshipService;
