//! Amity Domain Layer
//!
//! Core model for the friend-relationship lifecycle. Defines the stored
//! edge, the viewer-relative status derived from it, the read projections
//! handed to clients, and the store trait every persistence backend
//! implements.
//!
//! ## Key Concepts
//!
//! - **Edge**: the single stored record joining two users with a status
//! - **FriendStatus**: the same edge interpreted from one participant's side
//! - **FriendRequest / Friend**: edges joined with profile data for display
//!
//! ## Lifecycle
//!
//! ```text
//! ∅ ──send──▶ pending ──accept──▶ accepted ──remove──▶ ∅
//!                │
//!                └──decline──▶ ∅
//! ```
//!
//! There is no path from `accepted` back to `pending`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge;
pub mod projection;
pub mod status;
pub mod traits;

// Re-exports for convenience
pub use edge::{Edge, EdgeId, EdgeStatus, RequestAction, UserId};
pub use projection::{Friend, FriendRequest, Profile};
pub use status::{derive_status, FriendStatus, StatusView};
