// Screen state owned by the UI domain
//
// Everything here is only reachable through a hop into the UI domain, which
// makes these types the "main actor" side of the crate.

use crate::models::User;
use tokio::sync::broadcast;

/// Receiver of display values
///
/// Sinks live inside the UI domain's state, so `render` can only be called
/// from an operation running in that domain.
pub trait StateSink {
    type Value;

    fn render(&mut self, value: Self::Value);
}

/// Emitted every time a sink renders, in render order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderEvent {
    pub sink: &'static str,
    pub text: String,
    /// Per-sink render counter, starting at 1
    pub frame: u64,
}

/// A text sink
#[derive(Debug)]
pub struct Label {
    id: &'static str,
    text: String,
    frame: u64,
    renders: broadcast::Sender<RenderEvent>,
}

impl Label {
    pub(crate) fn new(
        id: &'static str,
        text: &str,
        renders: broadcast::Sender<RenderEvent>,
    ) -> Self {
        Self {
            id,
            text: text.to_string(),
            frame: 0,
            renders,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }
}

impl StateSink for Label {
    type Value = String;

    fn render(&mut self, value: String) {
        self.frame += 1;
        self.text = value;
        // Ignore send errors - it's OK if no one is listening
        let _ = self.renders.send(RenderEvent {
            sink: self.id,
            text: self.text.clone(),
            frame: self.frame,
        });
    }
}

/// Counter whose state may only change inside the UI domain
#[derive(Debug, Default)]
pub struct CounterViewModel {
    state: i64,
}

impl CounterViewModel {
    pub fn state(&self) -> i64 {
        self.state
    }

    pub fn increment(&mut self) {
        self.state += 1;
    }

    pub fn set_state(&mut self, value: i64) {
        self.state = value;
    }
}

/// The UI domain's state
#[derive(Debug)]
pub struct Screen {
    pub label: Label,
    pub counter: CounterViewModel,
    pub user: Option<User>,
}

impl Screen {
    pub(crate) fn new(renders: broadcast::Sender<RenderEvent>) -> Self {
        Self {
            label: Label::new("label", "state: 0", renders),
            counter: CounterViewModel::default(),
            user: None,
        }
    }

    /// Render the counter into the label
    pub fn show_counter(&mut self, prefix: &str) {
        let text = format!("{prefix} state: {}", self.counter.state());
        self.label.render(text);
    }
}
