// UiBridge - Coordinates between the tokio runtime and the UI domain
//
// The UI domain is an IsolatedDomain<Screen>: one serialized executor thread
// that owns every sink and view model. The bridge provides:
// - Awaited hops into the UI domain from any task (`run`)
// - Fire-and-forget UI updates that never block the caller (`update_ui`)
// - Spawning work on the tokio pool that hops back when done (`spawn_async`)
// - Render event subscription for observers outside the domain

use super::screen::{RenderEvent, Screen};
use crate::state::{DomainError, IsolatedDomain};
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Bound on queued UI updates, as in a UI event loop that must not grow
/// without limit when it lags
pub const UI_QUEUE_CAPACITY: usize = 100;

/// Coordinates between the tokio runtime and the UI domain
///
/// Cheap to clone; every clone addresses the same UI domain.
///
/// # Example
/// ```ignore
/// let ui = UiBridge::new(runtime.handle().clone())?;
///
/// ui.spawn_async({
///     let ui = ui.clone();
///     move || async move {
///         let sum = expensive_work().await;
///         ui.update_ui(move |screen| screen.counter.set_state(sum));
///     }
/// });
/// ```
#[derive(Clone, Debug)]
pub struct UiBridge {
    domain: IsolatedDomain<Screen>,

    /// Handle to the tokio runtime for spawning async tasks
    tokio_handle: tokio::runtime::Handle,

    renders: broadcast::Sender<RenderEvent>,
}

impl UiBridge {
    /// Start the UI domain with the default queue bound
    pub fn new(tokio_handle: tokio::runtime::Handle) -> Result<Self, DomainError> {
        Self::with_capacity(tokio_handle, UI_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        tokio_handle: tokio::runtime::Handle,
        capacity: usize,
    ) -> Result<Self, DomainError> {
        let (renders, _) = broadcast::channel(capacity.max(1));
        let screen = Screen::new(renders.clone());

        Ok(Self {
            domain: IsolatedDomain::with_capacity("ui", screen, capacity)?,
            tokio_handle,
            renders,
        })
    }

    /// Hop into the UI domain and return the closure's result
    pub async fn run<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut Screen) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.domain.hop(f).await
    }

    /// Schedule a UI update from any thread without waiting
    ///
    /// Updates submitted from one caller run in submission order. If the UI
    /// queue is full the update is dropped with a warning rather than
    /// blocking the caller.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&mut Screen) + Send + 'static,
    {
        match self.domain.try_post(update) {
            Ok(()) => {}
            Err(DomainError::Busy { .. }) => {
                tracing::warn!("UI update queue full - skipping update to prevent backpressure");
            }
            Err(e) => {
                tracing::warn!("Failed to send UI update: {}", e);
            }
        }
    }

    /// Spawn an async task on the tokio runtime
    ///
    /// The task runs outside every domain; it reaches UI state only through
    /// [`run()`](Self::run) or [`update_ui()`](Self::update_ui).
    pub fn spawn_async<F, Fut>(&self, future_factory: F) -> JoinHandle<Fut::Output>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.tokio_handle.spawn(async move { future_factory().await })
    }

    /// Spawn a task whose body runs inside the UI domain
    pub fn spawn_in_ui<R, F>(&self, f: F) -> JoinHandle<Result<R, DomainError>>
    where
        F: FnOnce(&mut Screen) -> R + Send + 'static,
        R: Send + 'static,
    {
        let domain = self.domain.clone();
        self.tokio_handle.spawn(async move { domain.hop(f).await })
    }

    /// Subscribe to renders of every sink on the screen
    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.renders.subscribe()
    }

    /// The UI domain itself
    pub fn domain(&self) -> &IsolatedDomain<Screen> {
        &self.domain
    }

    pub fn tokio_handle(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::in_any_domain;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_executes_in_ui_domain() {
        let ui = UiBridge::new(tokio::runtime::Handle::current()).unwrap();

        let inside = ui.run(|_| in_any_domain()).await.unwrap();
        assert!(inside);
        assert!(!in_any_domain());
    }

    #[tokio::test]
    async fn test_update_ui_keeps_submission_order() {
        let ui = UiBridge::new(tokio::runtime::Handle::current()).unwrap();

        for i in 1..=5 {
            ui.update_ui(move |screen| screen.counter.set_state(i));
        }
        ui.update_ui(|screen| screen.show_counter("final"));

        let text = ui.run(|screen| screen.label.text().to_string()).await.unwrap();
        assert_eq!(text, "final state: 5");
    }

    #[tokio::test]
    async fn test_update_ui_drops_when_full() {
        let ui = UiBridge::with_capacity(tokio::runtime::Handle::current(), 1).unwrap();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        // Park the executor so the queue fills up
        ui.update_ui(move |_| {
            let _ = release_rx.recv_timeout(Duration::from_secs(2));
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        ui.update_ui(|screen| screen.counter.increment());
        ui.update_ui(|screen| screen.counter.increment());
        release_tx.send(()).unwrap();

        let state = ui.run(|screen| screen.counter.state()).await.unwrap();
        assert_eq!(state, 1);
        assert!(ui.domain().metrics().busy_rejections.load(Ordering::Relaxed) >= 1);
    }

    #[tokio::test]
    async fn test_spawn_async_runs_off_domain() {
        let ui = UiBridge::new(tokio::runtime::Handle::current()).unwrap();

        let handle = ui.spawn_async(|| async { in_any_domain() });
        assert!(!handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_subscribe_sees_renders() {
        let ui = UiBridge::new(tokio::runtime::Handle::current()).unwrap();
        let mut rx = ui.subscribe();

        ui.spawn_in_ui(|screen| {
            screen.counter.increment();
            screen.show_counter("Task");
        })
        .await
        .unwrap()
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.text, "Task state: 1");
        assert_eq!(event.frame, 1);
    }
}
