//! Services module - external collaborators of the bridge and domains.
//!
//! These are the callback-driven sources the rest of the crate bridges into
//! futures. They have no UI dependencies.
//!
//! # Components
//!
//! - [`UserSource`]: a callback-style lookup API (user by id, posts by user)
//! - [`UserSourceExt`]: awaitable versions of every [`UserSource`] lookup,
//!   built on [`ContinuationBridge`](crate::bridge::ContinuationBridge), plus
//!   sequential and parallel user-with-posts composition
//! - [`LegacyApiClient`]: mock [`UserSource`] answering from a
//!   [`Fixture`](crate::models::Fixture) after a simulated delay
//! - [`SearchService`], [`MockSearchService`], [`SearchCoordinator`]:
//!   debounced realtime search whose query state lives in an isolated domain
//!
//! # Usage Example
//!
//! ```ignore
//! use isobridge::services::{LegacyApiClient, UserSourceExt};
//!
//! let client = LegacyApiClient::with_defaults();
//!
//! let user = client.fetch_user("user1").await?;
//! let (user, posts) = client.fetch_user_with_posts("user1").await?;
//! ```

pub mod search;
pub mod source;

pub use search::{MockSearchService, SearchCoordinator, SearchService, SearchState};
pub use source::{Completion, LegacyApiClient, UserSource, UserSourceExt};
