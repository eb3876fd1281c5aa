//! Amity Rust SDK
//!
//! Client library for the Amity friends gateway, plus a view model that
//! keeps a local copy of the signed-in user's relationships.
//!
//! # Example
//!
//! ```no_run
//! use amity_sdk::{ClientViewModel, FriendsClient};
//!
//! # async fn demo() -> Result<(), amity_sdk::SdkError> {
//! let client = FriendsClient::new("http://localhost:8080", "<bearer token>");
//! let mut friends = ClientViewModel::new(client, "u-1".into());
//!
//! friends.send_request(&"u-2".into()).await?;
//! friends.refresh().await?;
//! for request in friends.pending_requests() {
//!     println!("{} wants to be friends", request.requester.display_name);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod error;
mod view_model;

pub use client::{FriendsApi, FriendsClient};
pub use error::{ErrorBody, SdkError};
pub use view_model::ClientViewModel;
