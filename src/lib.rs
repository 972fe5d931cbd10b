// isobridge - Continuation bridge and isolated state domains for tokio
//
// This is the library crate containing the bridge, the domains and their
// collaborators. The binary crate (main.rs) runs a walkthrough of each.

pub mod bridge;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use bridge::{BridgeHandle, Continuation, ContinuationBridge, parallel, sequence};
pub use config::ConfigManager;
pub use models::{ErrorKind, ResultBox, Settings};
pub use state::{DomainError, IsolatedDomain};
pub use ui::UiBridge;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
