//! Data models shared across the crate.
//!
//! - [`ErrorKind`] / [`ResultBox`]: the failure taxonomy and the single value a
//!   bridged operation resolves to
//! - [`User`], [`Post`], [`Fixture`]: records served by the mock data source
//! - [`SearchResult`], [`Category`]: hits returned by the search service
//! - [`Settings`]: configuration loaded from `isobridge.yaml`

pub mod config;
pub mod records;
pub mod result;

pub use config::{LoggingSettings, RuntimeSettings, SearchSettings, Settings, SourceSettings};
pub use records::{Category, Fixture, Post, SearchResult, User};
pub use result::{ErrorKind, ResultBox};
