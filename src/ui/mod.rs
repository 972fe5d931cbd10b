// UI module - the UI domain and the ways async work reaches it
//
// This module contains:
// - Screen: sinks and view models owned by the UI domain
// - UiBridge: Coordinates between the tokio runtime and the UI domain
// - patterns: detached hop, task started in the domain, compute then apply

pub mod bridge;
pub mod patterns;
pub mod screen;

pub use bridge::{UI_QUEUE_CAPACITY, UiBridge};
pub use screen::{CounterViewModel, Label, RenderEvent, Screen, StateSink};
